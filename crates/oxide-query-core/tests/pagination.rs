//! Pagination placement across dialect strategies.

mod common;
use common::*;

use oxide_query_core::dialect::{PaginationPlacement, PaginationStyle};
use oxide_query_core::{Dialect, Expression, Query, Select, SqlValue};

fn paged(limit: Option<u64>, offset: Option<u64>) -> Select<Expression<i64>> {
    let e = employee();
    let mut b = Query::new().from(&e);
    if let Some(n) = limit {
        b = b.limit(n);
    }
    if let Some(m) = offset {
        b = b.offset(m);
    }
    b.select(e.id.clone())
}

#[test]
fn limit_offset_trailing() {
    assert_eq!(
        sql(&paged(Some(4), Some(3))),
        "select employee.id from employee employee limit 4 offset 3"
    );
    assert_eq!(
        sql(&paged(Some(4), None)),
        "select employee.id from employee employee limit 4"
    );
    assert_eq!(
        sql(&paged(None, Some(3))),
        "select employee.id from employee employee offset 3"
    );
}

#[test]
fn limit_after_order_by() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .order_by(e.id.asc())
        .limit(4)
        .offset(3)
        .select(e.id.clone());
    assert_eq!(
        sql(&q),
        "select employee.id from employee employee order by employee.id asc limit 4 offset 3"
    );
}

#[test]
fn sqlite_offset_only() {
    let d = Dialect::sqlite().normalize_whitespace();
    assert_eq!(
        render_with(&paged(None, Some(3)), &d).sql,
        "select employee.id from employee employee limit -1 offset 3"
    );
}

#[test]
fn offset_fetch() {
    let d = Dialect::derby().normalize_whitespace();
    assert_eq!(
        render_with(&paged(Some(4), Some(3)), &d).sql,
        "select employee.id from employee employee offset 3 rows fetch next 4 rows only"
    );
}

#[test]
fn top_without_offset() {
    let d = Dialect::sqlserver().normalize_whitespace();
    assert_eq!(
        d.render_pagination(Some(4), None).placement(),
        PaginationPlacement::AfterSelect
    );
    assert_eq!(
        render_with(&paged(Some(4), None), &d).sql,
        "select top 4 employee.id from employee employee"
    );
}

#[test]
fn top_with_offset_uses_row_number() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .order_by(e.id.asc())
        .limit(4)
        .offset(3)
        .select(e.id.clone());
    let d = Dialect::sqlserver().normalize_whitespace();
    assert_eq!(
        render_with(&q, &d).sql,
        "select * from ( select employee.id, row_number() over (order by employee.id asc) as rn \
         from employee employee ) a where a.rn > 3 and a.rn <= 7 order by a.rn"
    );
    assert_eq!(
        render_with(&paged(None, Some(3)), &d).sql,
        "select * from ( select employee.id, row_number() over (order by current_timestamp) as rn \
         from employee employee ) a where a.rn > 3 order by a.rn"
    );
}

#[test]
fn rownum_wrapping() {
    let d = Dialect::oracle().normalize_whitespace();
    assert_eq!(
        render_with(&paged(Some(4), None), &d).sql,
        "select * from ( select employee.id from employee employee ) where rownum <= 4"
    );
    assert_eq!(
        render_with(&paged(Some(4), Some(3)), &d).sql,
        "select * from ( select a.*, rownum rn from ( select employee.id from employee employee ) a \
         where rownum <= 7 ) where rn > 3"
    );
    assert_eq!(
        render_with(&paged(None, Some(3)), &d).sql,
        "select * from ( select a.*, rownum rn from ( select employee.id from employee employee ) a \
         ) where rn > 3"
    );
}

#[test]
fn pagination_style_override() {
    let d = Dialect::generic()
        .with_pagination(PaginationStyle::RowNum)
        .normalize_whitespace();
    assert!(render_with(&paged(Some(1), None), &d)
        .sql
        .ends_with("where rownum <= 1"));
}

#[test]
fn wrapped_pagination_keeps_parameter_order() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .where_(&e.salary.gt(10.0))
        .order_by(e.salary.add(1.0).desc())
        .limit(2)
        .offset(1)
        .select(e.firstname.concat("!"));
    let d = Dialect::sqlserver().normalize_whitespace();
    let r = render_with(&q, &d);
    assert_eq!(
        r.sql,
        "select * from ( select employee.firstname + ?, row_number() over (order by employee.salary + ? desc) as rn \
         from employee employee where employee.salary > ? ) a where a.rn > 1 and a.rn <= 3 order by a.rn"
    );
    assert_eq!(
        r.params,
        vec![text("!"), SqlValue::Float(1.0), SqlValue::Float(10.0)]
    );
}
