//! Rendering of single SELECT statements: clauses, expressions,
//! parameters and sub-queries.

mod common;
use common::*;

use chrono::NaiveDate;
use oxide_query_core::dialect::{IdentifierQuoting, KeywordCase};
use oxide_query_core::expr::{count_all, exists, max, Relation};
use oxide_query_core::{Dialect, IntoExpression, Predicate, Query, SqlValue};

#[test]
fn round_trip_simple_filter() {
    let s = survey();
    let q = Query::new()
        .from(&s)
        .where_(&s.id.eq(1))
        .select((s.id.clone(), s.name.clone()));
    let r = q.render(&Dialect::default()).unwrap();
    assert_eq!(
        r.sql,
        "select survey.id, survey.name from survey survey where survey.id = ?"
    );
    assert_eq!(r.params, vec![SqlValue::Int(1)]);
}

#[test]
fn count_with_is_null() {
    let t = test_table();
    let q = Query::new()
        .from(&t)
        .where_(&t.name.is_null())
        .select(count_all());
    assert_eq!(sql(&q), "select count(*) from test test where test.name is null");
}

#[test]
fn like_patterns_are_not_wildcarded() {
    let t = test_table();
    let empty = Query::new().from(&t).where_(&t.name.like("")).select(count_all());
    let any = Query::new().from(&t).where_(&t.name.like("%")).select(count_all());
    assert_eq!(
        sql(&empty),
        "select count(*) from test test where test.name like ''"
    );
    assert_eq!(
        sql(&any),
        "select count(*) from test test where test.name like '%'"
    );
    assert!(render(&any).params.is_empty());
}

#[test]
fn scalar_subquery_in_filter() {
    let e = employee();
    let sub = Query::new().from(&e).select(max(&e.id));
    let q = Query::new().from(&e).where_(&e.id.eq(&sub)).select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee \
         where employee.id = (select max(employee.id) from employee employee)"
    );
}

#[test]
fn subquery_in_projection() {
    let e = employee();
    let sub = Query::new().from(&e).select(max(&e.id));
    let q = Query::new()
        .from(&e)
        .select((e.id.clone(), sub.into_expression()));
    assert_eq!(
        sql(&q),
        "select employee.id, (select max(employee.id) from employee employee) \
         from employee employee"
    );
}

#[test]
fn in_and_exists_subqueries() {
    let e = employee();
    let boss = QEmployee::new("boss");
    let bosses = Query::new()
        .from(&boss)
        .where_(&boss.salary.gt(1000.0))
        .select(boss.id.clone());
    let q = Query::new()
        .from(&e)
        .where_(&e.superior_id.in_subquery(&bosses))
        .select(e.id.clone());
    let r = render(&q);
    assert_eq!(
        r.sql,
        "select employee.id from employee employee where employee.superior_id in \
         (select boss.id from employee boss where boss.salary > ?)"
    );
    assert_eq!(r.params, vec![SqlValue::Float(1000.0)]);

    let any = Query::new()
        .from(&boss)
        .where_(&boss.id.eq(&e.superior_id))
        .select((boss.id.clone(), boss.firstname.clone()));
    let q = Query::new().from(&e).where_(&exists(&any)).select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee where exists \
         (select boss.id, boss.firstname from employee boss where boss.id = employee.superior_id)"
    );
}

#[test]
fn in_list() {
    let s = survey();
    let q = Query::new()
        .from(&s)
        .where_(&s.id.in_list([1, 2, 3]).unwrap())
        .select(s.id.clone());
    let r = render(&q);
    assert_eq!(
        r.sql,
        "select survey.id from survey survey where survey.id in (?, ?, ?)"
    );
    assert_eq!(
        r.params,
        vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3)]
    );
}

#[test]
fn joins_with_conditions() {
    let e = employee();
    let boss = QEmployee::new("boss");
    let q = Query::new()
        .from(&e)
        .left_join(&boss)
        .on(&e.superior_id.eq(&boss.id))
        .where_(&boss.lastname.is_not_null())
        .select((e.firstname.clone(), boss.firstname.clone()));
    assert_eq!(
        sql(&q),
        "select employee.firstname, boss.firstname from employee employee \
         left join employee boss on employee.superior_id = boss.id \
         where boss.lastname is not null"
    );
}

#[test]
fn repeated_on_conjoins() {
    let e = employee();
    let boss = QEmployee::new("boss");
    let q = Query::new()
        .from(&e)
        .inner_join(&boss)
        .on(&e.superior_id.eq(&boss.id))
        .on(&boss.salary.gt(&e.salary))
        .select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee \
         inner join employee boss on employee.superior_id = boss.id and boss.salary > employee.salary"
    );
}

#[test]
fn on_after_from_or_cross_join_filters_in_where() {
    let e = employee();
    let boss = QEmployee::new("boss");
    let q = Query::new()
        .from(&e)
        .cross_join(&boss)
        .on(&e.superior_id.eq(&boss.id))
        .select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee cross join employee boss \
         where employee.superior_id = boss.id"
    );

    let q = Query::new()
        .from(&e)
        .on(&e.salary.gt(1000.0))
        .where_(&e.id.ne(2))
        .select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee \
         where employee.salary > ? and employee.id <> ?"
    );
}

#[test]
fn count_keeps_distinct_and_grouping_inside_derived_table() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .distinct()
        .select(e.superior_id.clone());
    assert_eq!(
        sql(&q.count()),
        "select count(*) from (select distinct employee.superior_id from employee employee) c"
    );

    let q = Query::new()
        .from(&e)
        .group_by(&e.superior_id)
        .order_by(e.superior_id.asc())
        .limit(2)
        .select((e.superior_id.clone(), max(&e.salary)));
    assert_eq!(
        sql(&q.count()),
        "select count(*) from (select employee.superior_id, max(employee.salary) \
         from employee employee group by employee.superior_id) c"
    );
}

#[test]
fn comma_separated_sources() {
    let s = survey();
    let s2 = QSurvey::new("s2");
    let q = Query::new()
        .from(&s)
        .from(&s2)
        .where_(&s.id.eq(&s2.id))
        .select(s.name.clone());
    assert_eq!(
        sql(&q),
        "select survey.name from survey survey, survey s2 where survey.id = s2.id"
    );
}

#[test]
fn group_by_having_order_by() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .group_by(&e.superior_id)
        .having(&count_all().gt(1))
        .order_by(e.superior_id.asc())
        .select((e.superior_id.nullable(), count_all()));
    let r = render(&q);
    assert_eq!(
        r.sql,
        "select employee.superior_id, count(*) from employee employee \
         group by employee.superior_id having count(*) > ? \
         order by employee.superior_id asc"
    );
    assert_eq!(r.params, vec![SqlValue::Int(1)]);
}

#[test]
fn having_without_group_by_is_forwarded() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .having(&count_all().gt(0))
        .select(count_all());
    assert_eq!(
        sql(&q),
        "select count(*) from employee employee having count(*) > ?"
    );
}

#[test]
fn distinct_and_descending_order() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .distinct()
        .order_by(e.lastname.desc())
        .order_by(e.firstname.asc())
        .select(e.lastname.clone());
    assert_eq!(
        sql(&q),
        "select distinct employee.lastname from employee employee \
         order by employee.lastname desc, employee.firstname asc"
    );
}

#[test]
fn where_called_twice_conjoins() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .where_(&e.firstname.eq("Mike"))
        .where_(&e.salary.ge(10.5))
        .where_(&e.datefield.lt(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()))
        .select(e.id.clone());
    let r = render(&q);
    assert_eq!(
        r.sql,
        "select employee.id from employee employee \
         where employee.firstname = ? and employee.salary >= ? and employee.datefield < ?"
    );
    assert_eq!(
        r.params,
        vec![
            text("Mike"),
            SqlValue::Float(10.5),
            SqlValue::Date(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
        ]
    );
}

#[test]
fn arithmetic_and_string_functions() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .where_(&(e.salary.clone() + 100.0).multiply(2.0).gt(5000.0))
        .select((
            e.firstname.lower().concat(" ").concat(e.lastname.upper()),
            e.firstname.substring(0, 3),
        ));
    let r = render(&q);
    assert_eq!(
        r.sql,
        "select lower(employee.firstname) || ? || upper(employee.lastname), \
         substr(employee.firstname,?+1,?) from employee employee \
         where (employee.salary + ?) * ? > ?"
    );
    assert_eq!(
        r.params,
        vec![
            text(" "),
            SqlValue::Int(0),
            SqlValue::Int(3),
            SqlValue::Float(100.0),
            SqlValue::Float(2.0),
            SqlValue::Float(5000.0),
        ]
    );
}

#[test]
fn predicate_composition_parenthesizes() {
    let e = employee();
    let p = e
        .firstname
        .eq("A")
        .or(&e.firstname.eq("B"))
        .and(&e.salary.between(1.0, 2.0));
    let q = Query::new().from(&e).where_(&p).select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee \
         where (employee.firstname = ? or employee.firstname = ?) \
         and employee.salary between ? and ?"
    );
    let all = Predicate::all(&[e.id.gt(1), e.id.lt(9), e.id.ne(5)]).unwrap();
    let q = Query::new().from(&e).where_(&all.not()).select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee \
         where not (employee.id > ? and employee.id < ? and employee.id <> ?)"
    );
}

#[test]
fn multiline_output_without_normalization() {
    let s = survey();
    let q = Query::new()
        .from(&s)
        .where_(&s.id.eq(1))
        .order_by(s.id.asc())
        .limit(1)
        .select(s.name.clone());
    assert_eq!(
        render_with(&q, &Dialect::hsqldb()).sql,
        "select survey.name\nfrom survey survey\nwhere survey.id = ?\norder by survey.id asc\nlimit 1"
    );
}

#[test]
fn quoting_and_keyword_case() {
    let s = survey();
    let q = Query::new()
        .from(&s)
        .where_(&s.name.is_null())
        .select(s.id.clone());
    let mysql = Dialect::mysql()
        .with_quoting(IdentifierQuoting::Always)
        .normalize_whitespace();
    assert_eq!(
        render_with(&q, &mysql).sql,
        "select `survey`.`id` from `survey` `survey` where `survey`.`name` is null"
    );
    let upper = Dialect::generic()
        .with_keyword_case(KeywordCase::Upper)
        .normalize_whitespace();
    assert_eq!(
        render_with(&q, &upper).sql,
        "SELECT survey.id FROM survey survey WHERE survey.name IS NULL"
    );

    let orders = Relation::named("orders");
    let q = Query::new()
        .from(&orders)
        .select(orders.column::<i64>("order"));
    assert_eq!(sql(&q), "select orders.\"order\" from orders orders");
}

#[test]
fn rendering_is_deterministic() {
    let e = employee();
    let sub = Query::new().from(&e).where_(&e.salary.gt(3.0)).select(max(&e.id));
    let q = Query::new()
        .from(&e)
        .where_(&e.id.eq(&sub).or(&e.firstname.like("J%")))
        .order_by(e.id.desc())
        .limit(10)
        .select((e.id.clone(), e.firstname.clone()));
    let d = dialect();
    let first = render_with(&q, &d);
    for _ in 0..10 {
        assert_eq!(render_with(&q, &d), first);
    }
}
