use crate::config::Config;
use crate::data::filter::ConstraintSet;
use crate::data::model::Dataset;
use crate::data::summary::SummaryTable;
use crate::error::Result;

use super::base_pipeline;

/// Combined score column appended to the genre table.
pub const AVG_SCORE: &str = "avg_score";

/// Mean of each genre metric per favourite genre, plus their row mean,
/// sorted ascending by that combined score.
pub fn build(dataset: &Dataset, config: &Config, constraints: &ConstraintSet) -> Result<SummaryTable> {
    let schema = &config.schema;
    let group = [schema.genre.clone()];
    let pipeline = base_pipeline(config, constraints)
        .group_by(group.clone())
        .metrics(schema.genre_metrics.clone());

    let rows = pipeline.run(dataset)?;
    SummaryTable::from_rows(&rows, &group, &schema.genre_metrics)
        .with_row_mean(AVG_SCORE)
        .sort_by(AVG_SCORE, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::Constraint;
    use crate::data::loader::read_csv;
    use crate::data::model::Value;

    const SURVEY: &str = "\
Age,Hours per day,Fav genre,Anxiety,Depression,Insomnia,OCD
18,3,Rock,8,6,4,1
22,2,Rock,6,4,2,0
35,1,Jazz,2,2,2,2
41,4,Metal,9,N/A,5,3
";

    #[test]
    fn genre_means_sorted_by_avg_score() {
        let ds = read_csv(SURVEY.as_bytes()).unwrap();
        let table = build(&ds, &Config::default(), &ConstraintSet::new()).unwrap();
        let order: Vec<&Value> = table.rows.iter().map(|r| &r.key[0]).collect();
        // Metal drops out: its Depression is not a number
        assert_eq!(order, vec![&Value::from("Jazz"), &Value::from("Rock")]);
        assert_eq!(table.value(1, "Anxiety"), Some(7.0));
        assert_eq!(table.value(1, AVG_SCORE), Some(5.0));
        assert_eq!(table.value_fields.last().map(String::as_str), Some(AVG_SCORE));
    }

    #[test]
    fn age_constraint_narrows_genres() {
        let ds = read_csv(SURVEY.as_bytes()).unwrap();
        let cs = ConstraintSet::new().with(Constraint::range("Age", 30.0, 40.0));
        let table = build(&ds, &Config::default(), &cs).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].key[0], Value::from("Jazz"));
    }
}
