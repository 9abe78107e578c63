#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use oxide_query_core::error::ExecuteError;
use oxide_query_core::{
    Dialect, Expression, RenderedQuery, Relation, Row, Source, SqlValue, TypedQuery,
};

/// Typed paths for the `survey` table.
pub struct QSurvey {
    relation: Relation,
    pub id: Expression<i64>,
    pub name: Expression<String>,
}

impl QSurvey {
    pub fn new(alias: &str) -> Self {
        let relation = Relation::new("survey", alias);
        Self {
            id: relation.column("id"),
            name: relation.column("name"),
            relation,
        }
    }
}

impl Source for QSurvey {
    fn relation(&self) -> &Relation {
        &self.relation
    }
}

/// Typed paths for the `employee` table.
pub struct QEmployee {
    relation: Relation,
    pub id: Expression<i64>,
    pub firstname: Expression<String>,
    pub lastname: Expression<String>,
    pub salary: Expression<f64>,
    pub superior_id: Expression<i64>,
    pub datefield: Expression<NaiveDate>,
    pub timefield: Expression<NaiveTime>,
}

impl QEmployee {
    pub fn new(alias: &str) -> Self {
        let relation = Relation::new("employee", alias);
        Self {
            id: relation.column("id"),
            firstname: relation.column("firstname"),
            lastname: relation.column("lastname"),
            salary: relation.column("salary"),
            superior_id: relation.column("superior_id"),
            datefield: relation.column("datefield"),
            timefield: relation.column("timefield"),
            relation,
        }
    }
}

impl Source for QEmployee {
    fn relation(&self) -> &Relation {
        &self.relation
    }
}

/// Typed paths for the `test` table.
pub struct QTest {
    relation: Relation,
    pub name: Expression<String>,
}

impl QTest {
    pub fn new(alias: &str) -> Self {
        let relation = Relation::new("test", alias);
        Self {
            name: relation.column("name"),
            relation,
        }
    }
}

impl Source for QTest {
    fn relation(&self) -> &Relation {
        &self.relation
    }
}

pub fn survey() -> QSurvey {
    QSurvey::new("survey")
}

pub fn employee() -> QEmployee {
    QEmployee::new("employee")
}

pub fn test_table() -> QTest {
    QTest::new("test")
}

/// The dialect most assertions are written against: HSQLDB on one line.
pub fn dialect() -> Dialect {
    Dialect::hsqldb().normalize_whitespace()
}

pub fn render<Q: TypedQuery>(query: &Q) -> RenderedQuery {
    render_with(query, &dialect())
}

pub fn render_with<Q: TypedQuery>(query: &Q, dialect: &Dialect) -> RenderedQuery {
    oxide_query_core::Serializer::new(dialect)
        .serialize(query.model())
        .unwrap_or_else(|e| panic!("Failed to render: {e}"))
}

pub fn sql<Q: TypedQuery>(query: &Q) -> String {
    render(query).sql
}

/// An executor returning the same rows for every statement.
pub fn canned(
    rows: Vec<Row>,
) -> impl FnMut(&str, &[SqlValue]) -> Result<Vec<Row>, ExecuteError> {
    move |_, _| Ok(rows.clone())
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(String::from(s))
}
