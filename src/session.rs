use std::collections::BTreeSet;

use log::debug;

use crate::config::Config;
use crate::data::filter::{Constraint, ConstraintSet};
use crate::data::model::Dataset;
use crate::data::summary::SummaryTable;
use crate::error::Result;
use crate::views::{self, View, AGE_GROUP};

// ---------------------------------------------------------------------------
// Filter selection
// ---------------------------------------------------------------------------

/// What the user has picked in the filter widgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Inclusive age range; `None` means no age filter.
    pub age: Option<(f64, f64)>,
    /// Inclusive daily-hours range; `None` means no hours filter.
    pub hours: Option<(f64, f64)>,
    /// Selected genres.  All genres selected means no genre filter.
    pub genres: BTreeSet<String>,
    /// Single age group; `None` means every group.
    pub age_group: Option<String>,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The loaded dataset plus the current selection.  Every render runs the
/// view pipeline over the original dataset.
pub struct Session {
    dataset: Dataset,
    config: Config,
    all_genres: BTreeSet<String>,
    pub selection: Selection,
}

impl Session {
    /// Start a session with everything selected.  Fails if the dataset lacks
    /// any configured column.
    pub fn new(dataset: Dataset, config: Config) -> Result<Self> {
        let schema = &config.schema;
        let mut required = vec![schema.age.clone(), schema.hours.clone(), schema.genre.clone()];
        required.extend(config.all_metrics());
        dataset.require_columns(&required)?;

        let all_genres: BTreeSet<String> = dataset
            .unique_values(&schema.genre)
            .iter()
            .filter_map(|v| v.as_key())
            .collect();
        let selection = Selection {
            genres: all_genres.clone(),
            ..Selection::default()
        };
        debug!("session: {} record(s), {} genre(s)", dataset.len(), all_genres.len());

        Ok(Self {
            dataset,
            config,
            all_genres,
            selection,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Every genre present in the dataset, sorted.
    pub fn genres(&self) -> &BTreeSet<String> {
        &self.all_genres
    }

    /// Age-group labels in bin order.
    pub fn age_groups(&self) -> &[String] {
        self.config.bins.age_groups.labels()
    }

    /// Observed age span, for slider bounds.
    pub fn age_span(&self) -> Option<(f64, f64)> {
        self.dataset.numeric_span(&self.config.schema.age)
    }

    /// Observed hours span, for slider bounds.
    pub fn hours_span(&self) -> Option<(f64, f64)> {
        self.dataset.numeric_span(&self.config.schema.hours)
    }

    pub fn set_age_range(&mut self, lo: f64, hi: f64) {
        self.selection.age = Some((lo, hi));
    }

    pub fn set_hours_range(&mut self, lo: f64, hi: f64) {
        self.selection.hours = Some((lo, hi));
    }

    pub fn set_age_group(&mut self, group: Option<String>) {
        self.selection.age_group = group;
    }

    /// Toggle a single genre in the selection.
    pub fn toggle_genre(&mut self, genre: &str) {
        if !self.selection.genres.remove(genre) {
            self.selection.genres.insert(genre.to_string());
        }
    }

    /// Replace the genre selection.
    pub fn select_genres<I: IntoIterator<Item = String>>(&mut self, genres: I) {
        self.selection.genres = genres.into_iter().collect();
    }

    pub fn select_all_genres(&mut self) {
        self.selection.genres = self.all_genres.clone();
    }

    pub fn select_no_genres(&mut self) {
        self.selection.genres.clear();
    }

    /// Constraint set equivalent to the current selection.
    pub fn constraints(&self) -> ConstraintSet {
        let schema = &self.config.schema;
        let mut cs = ConstraintSet::new();
        if let Some((lo, hi)) = self.selection.age {
            cs.push(Constraint::range(&schema.age, lo, hi));
        }
        if let Some((lo, hi)) = self.selection.hours {
            cs.push(Constraint::range(&schema.hours, lo, hi));
        }
        // everything selected → no effective genre filter
        if self.selection.genres != self.all_genres {
            cs.push(Constraint::one_of(
                &schema.genre,
                self.selection.genres.iter().cloned(),
            ));
        }
        if let Some(group) = &self.selection.age_group {
            cs.push(Constraint::equals(AGE_GROUP, group));
        }
        cs
    }

    /// Recompute `view` from the original dataset under the current selection.
    pub fn render(&self, view: View) -> Result<SummaryTable> {
        let constraints = self.constraints();
        debug!("render {view}: {} constraint(s)", constraints.constraints.len());
        views::render(view, &self.dataset, &self.config, &constraints)
    }
}
