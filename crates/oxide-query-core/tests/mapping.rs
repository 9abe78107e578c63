//! Row mapping through projections, constructors and the query runner.

mod common;
use common::*;

use chrono::NaiveDate;
use oxide_query_core::error::{ExecuteError, ProjectionMappingError};
use oxide_query_core::expr::count_all;
use oxide_query_core::mapper::Columns;
use oxide_query_core::{
    Constructor, Constructors, Expression, Projection, Query, QueryError, QueryRunner,
    RecordingHook, ResultMapper, Row, RowValue, SqlValue,
};

#[derive(Debug, PartialEq)]
struct FooDto {
    name: String,
    id: Option<i64>,
}

fn foo_constructors() -> Constructors<FooDto> {
    Constructors::new()
        .register(Constructor::new(|(name,): (String,)| FooDto { name, id: None }))
        .register(Constructor::new(|(name, id): (String, i64)| FooDto {
            name,
            id: Some(id),
        }))
}

#[test]
fn tuple_projection_maps_positionally() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .select((e.id.clone(), Expression::constant(String::from("Hello World"))));
    let mut runner = QueryRunner::new(
        dialect(),
        canned(vec![vec![SqlValue::Int(1), text("Hello World")]]),
    );
    let rows = runner.list(&q).unwrap();
    assert_eq!(rows, vec![(1, String::from("Hello World"))]);
}

#[test]
fn constructors_pick_by_arity() {
    let e = employee();
    let ctors = foo_constructors();

    let one = ctors.project(vec![e.firstname.shared()]).unwrap();
    let two = ctors
        .project(vec![e.firstname.shared(), e.id.shared()])
        .unwrap();
    assert_eq!(one.arity(), 1);
    assert_eq!(two.arity(), 2);

    let q = Query::new().from(&e).select(two);
    assert_eq!(
        sql(&q),
        "select employee.firstname, employee.id from employee employee"
    );
    let mut runner = QueryRunner::new(
        dialect(),
        canned(vec![vec![text("Bob"), SqlValue::Int(7)]]),
    );
    assert_eq!(
        runner.list(&q).unwrap(),
        vec![FooDto {
            name: String::from("Bob"),
            id: Some(7)
        }]
    );

    let rows = ResultMapper::new(&one).map_rows(vec![vec![text("Ann")]]).unwrap();
    assert_eq!(
        rows,
        vec![FooDto {
            name: String::from("Ann"),
            id: None
        }]
    );
}

#[test]
fn constructor_arity_mismatch() {
    let e = employee();
    let err = foo_constructors()
        .project(vec![e.id.shared(), e.firstname.shared(), e.lastname.shared()])
        .unwrap_err();
    assert_eq!(
        err,
        ProjectionMappingError::ArityMismatch {
            expected: 2,
            found: 3
        }
    );
}

#[test]
fn nullable_and_widened_columns() {
    let e = employee();
    let projection = (e.salary.clone(), e.superior_id.nullable(), e.datefield.clone());
    let mapper = ResultMapper::new(&projection);
    let row: Row = vec![SqlValue::Int(1200), SqlValue::Null, text("2000-01-02")];
    let (salary, superior, date) = mapper.map_row(row).unwrap();
    assert!((salary - 1200.0).abs() < f64::EPSILON);
    assert_eq!(superior, None);
    assert_eq!(date, NaiveDate::from_ymd_opt(2000, 1, 2).unwrap());
}

#[test]
fn null_in_required_column_is_a_type_mismatch() {
    let e = employee();
    let mapper = ResultMapper::new(&e.id);
    let err = mapper.map_row(vec![SqlValue::Null]).unwrap_err();
    assert!(matches!(
        err,
        ProjectionMappingError::TypeMismatch { column: 0, .. }
    ));
}

#[test]
fn boolean_in_integer_column_is_a_type_mismatch() {
    let e = employee();
    let err = ResultMapper::new(&e.id)
        .map_row(vec![SqlValue::Bool(true)])
        .unwrap_err();
    assert_eq!(
        err,
        ProjectionMappingError::TypeMismatch {
            column: 0,
            expected: "i64",
            found: "bool"
        }
    );
}

#[test]
fn short_rows_fail_and_extra_columns_are_ignored() {
    let e = employee();
    let projection = (e.id.clone(), e.firstname.clone());
    let mapper = ResultMapper::new(&projection);
    assert_eq!(
        mapper.map_row(vec![SqlValue::Int(1)]).unwrap_err(),
        ProjectionMappingError::RowTooShort {
            expected: 2,
            found: 1
        }
    );
    let (id, name) = mapper
        .map_row(vec![SqlValue::Int(1), text("a"), text("ignored")])
        .unwrap();
    assert_eq!((id, name.as_str()), (1, "a"));
}

#[test]
fn dynamic_columns_yield_scalars_or_tuples() {
    let e = employee();
    let single = Columns::new(vec![e.id.shared()]);
    let pair = Columns::new(vec![e.id.shared(), e.firstname.shared()]);
    assert_eq!(
        ResultMapper::new(&single)
            .map_row(vec![SqlValue::Int(3)])
            .unwrap(),
        RowValue::Scalar(SqlValue::Int(3))
    );
    assert_eq!(
        ResultMapper::new(&pair)
            .map_row(vec![SqlValue::Int(3), text("x")])
            .unwrap(),
        RowValue::Tuple(vec![SqlValue::Int(3), text("x")])
    );
}

#[test]
fn mapped_projection_post_processes_rows() {
    let e = employee();
    let q = Query::new()
        .from(&e)
        .select((e.firstname.clone(), e.lastname.clone()).map_to(|(f, l)| format!("{f} {l}")));
    let mut runner = QueryRunner::new(
        dialect(),
        canned(vec![vec![text("Jane"), text("Doe")]]),
    );
    assert_eq!(runner.list(&q).unwrap(), vec![String::from("Jane Doe")]);
}

#[test]
fn runner_records_sql_and_params() {
    let e = employee();
    let hook = RecordingHook::new();
    let mut runner =
        QueryRunner::new(dialect(), canned(vec![vec![SqlValue::Int(5)]])).with_hook(hook.clone());
    let q = Query::new()
        .from(&e)
        .where_(&e.firstname.eq("Jane"))
        .select(e.id.clone());
    assert_eq!(runner.unique_result(&q).unwrap(), Some(5));
    let recorded = hook.queries();
    assert_eq!(recorded.len(), 1);
    assert_eq!(
        recorded[0].sql,
        "select employee.id from employee employee where employee.firstname = ?"
    );
    assert_eq!(recorded[0].params, vec![text("Jane")]);
}

#[test]
fn unique_result_rejects_many_rows() {
    let e = employee();
    let mut runner = QueryRunner::new(
        dialect(),
        canned(vec![vec![SqlValue::Int(1)], vec![SqlValue::Int(2)]]),
    );
    let q = Query::new().from(&e).select(e.id.clone());
    let err = runner.unique_result(&q).unwrap_err();
    assert!(matches!(
        err,
        QueryError::ProjectionMapping(ProjectionMappingError::NonUniqueResult(2))
    ));
}

#[test]
fn count_drops_ordering_and_pagination() {
    let e = employee();
    let hook = RecordingHook::new();
    let mut runner =
        QueryRunner::new(dialect(), canned(vec![vec![SqlValue::Int(42)]])).with_hook(hook.clone());
    let q = Query::new()
        .from(&e)
        .where_(&e.salary.gt(1.0))
        .order_by(e.id.asc())
        .limit(5)
        .select((e.id.clone(), e.firstname.clone()));
    assert_eq!(runner.count(&q).unwrap(), 42);
    assert_eq!(
        hook.last_sql().unwrap(),
        "select count(*) from employee employee where employee.salary > ?"
    );
}

#[test]
fn count_of_distinct_query_uses_derived_table() {
    let e = employee();
    let hook = RecordingHook::new();
    let mut runner =
        QueryRunner::new(dialect(), canned(vec![vec![SqlValue::Int(3)]])).with_hook(hook.clone());
    let q = Query::new()
        .from(&e)
        .where_(&e.salary.gt(1.0))
        .distinct()
        .order_by(e.superior_id.asc())
        .limit(10)
        .select(e.superior_id.nullable());
    assert_eq!(runner.count(&q).unwrap(), 3);
    let rendered = hook.queries().pop().unwrap();
    assert_eq!(
        rendered.sql,
        "select count(*) from (select distinct employee.superior_id from employee employee \
         where employee.salary > ?) c"
    );
    assert_eq!(rendered.params, vec![SqlValue::Float(1.0)]);
}

#[test]
fn count_of_grouped_query_counts_groups() {
    let e = employee();
    let hook = RecordingHook::new();
    let mut runner =
        QueryRunner::new(dialect(), canned(vec![vec![SqlValue::Int(2)]])).with_hook(hook.clone());
    let q = Query::new()
        .from(&e)
        .group_by(&e.lastname)
        .having(&count_all().gt(1))
        .select((e.lastname.clone(), count_all()));
    assert_eq!(runner.count(&q).unwrap(), 2);
    assert_eq!(
        hook.last_sql().unwrap(),
        "select count(*) from (select employee.lastname, count(*) from employee employee \
         group by employee.lastname having count(*) > ?) c"
    );
}

#[test]
fn runner_lists_unions() {
    let e = employee();
    let branch = |name: &str| {
        Query::new()
            .from(&e)
            .where_(&e.firstname.eq(name))
            .select(count_all())
    };
    let u = Query::new().union_all([branch("A"), branch("B")]).unwrap();
    let mut runner = QueryRunner::new(
        dialect(),
        canned(vec![vec![SqlValue::Int(2)], vec![SqlValue::Int(3)]]),
    );
    assert_eq!(runner.list_union(&u).unwrap(), vec![2, 3]);
}

#[test]
fn executor_failures_surface() {
    let e = employee();
    let failing = |_: &str, _: &[SqlValue]| -> Result<Vec<Row>, ExecuteError> {
        Err(ExecuteError::new("connection refused"))
    };
    let mut runner = QueryRunner::new(dialect(), failing);
    let q = Query::new().from(&e).select(e.id.clone());
    let err = runner.list(&q).unwrap_err();
    assert_eq!(err.to_string(), "execution failed: connection refused");
}
