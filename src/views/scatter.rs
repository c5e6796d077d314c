use crate::config::Config;
use crate::data::filter::ConstraintSet;
use crate::data::model::Dataset;
use crate::data::summary::{SummaryTable, TableRow};
use crate::error::Result;

use super::base_pipeline;

/// Filtered, complete respondents as (age, hours, metric) points keyed by
/// genre.  No aggregation: one row per record, in source order.
pub fn build(dataset: &Dataset, config: &Config, constraints: &ConstraintSet) -> Result<SummaryTable> {
    let schema = &config.schema;
    let metric = &config.defaults.metric;
    let value_fields = vec![schema.age.clone(), schema.hours.clone(), metric.clone()];

    let points = base_pipeline(config, constraints)
        .require(value_fields.iter().cloned().chain([schema.genre.clone()]))
        .prepare(dataset)?;

    let rows = points
        .records
        .iter()
        .map(|record| TableRow {
            key: vec![record.get(&schema.genre).clone()],
            values: value_fields.iter().map(|f| record.get(f).as_f64()).collect(),
            count: 1,
        })
        .collect();

    Ok(SummaryTable {
        key_fields: vec![schema.genre.clone()],
        value_fields,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Constraint;
    use crate::data::loader::read_csv;
    use crate::data::model::Value;

    const SURVEY: &str = "\
Age,Hours per day,Fav genre,Anxiety,Depression,Insomnia,OCD
18,3,Rock,7,1,1,1
25,N/A,Pop,5,1,1,1
33,1,Jazz,not sure,1,1,1
47,6,Rock,2,1,1,1
";

    #[test]
    fn keeps_complete_points_in_order() {
        let ds = read_csv(SURVEY.as_bytes()).unwrap();
        let table = build(&ds, &Config::default(), &ConstraintSet::new()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].values, vec![Some(18.0), Some(3.0), Some(7.0)]);
        assert_eq!(table.rows[1].key, vec![Value::from("Rock")]);
    }

    #[test]
    fn hours_range_applies() {
        let ds = read_csv(SURVEY.as_bytes()).unwrap();
        let cs = ConstraintSet::new().with(Constraint::range("Hours per day", 4.0, 8.0));
        let table = build(&ds, &Config::default(), &cs).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, "Age"), Some(47.0));
    }

    #[test]
    fn missing_genre_column_is_fatal() {
        let ds = read_csv("Age,Hours per day,Anxiety,Depression,Insomnia,OCD\n1,1,1,1,1,1\n".as_bytes())
            .unwrap();
        assert!(build(&ds, &Config::default(), &ConstraintSet::new()).is_err());
    }
}
