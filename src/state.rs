use std::path::Path;
use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::data::aggregate::SummaryView;
use crate::data::filter::{self, Bounds, CategoryFilter, FilterPredicates};
use crate::data::loader::{DatasetLoader, LoadOptions};
use crate::data::model::{Dataset, DatasetExtents};
use crate::data::source::DataSource;
use crate::error::{Error, Result};
use crate::scoring::{CustomerProfile, ModelArtifact, predict_default_probability};

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Everything the dashboard shows, independent of rendering. Every setter
/// recomputes the derived view synchronously.
pub struct DashboardState {
    loader: Option<DatasetLoader>,
    load_options: LoadOptions,

    /// Loaded dataset (None until a source loads successfully).
    pub dataset: Option<Arc<Dataset>>,
    /// Slider ranges and selector choices of the loaded dataset.
    pub extents: Option<DatasetExtents>,

    pub predicates: FilterPredicates,
    /// Records passing `predicates`, for the table.
    pub filtered: Dataset,
    pub view: SummaryView,

    pub artifact: Option<Arc<ModelArtifact>>,
    /// Scoring form input.
    pub profile: CustomerProfile,
    pub prediction: Option<f64>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl DashboardState {
    pub fn new(load_options: LoadOptions) -> Self {
        Self {
            loader: None,
            load_options,
            dataset: None,
            extents: None,
            predicates: FilterPredicates::everything(),
            filtered: Dataset::default(),
            view: SummaryView::of(&Dataset::default()),
            artifact: None,
            profile: CustomerProfile::default(),
            prediction: None,
            status_message: None,
        }
    }

    /// Open the configured dataset and model. Every startup failure, a
    /// rejected configuration file included, ends up in the status line and
    /// the dashboard still starts.
    pub fn from_config(config: &DashboardConfig, config_error: Option<Error>) -> Self {
        let mut state = Self::new(config.load_options());
        let errors: Vec<String> = [
            config_error,
            state.open_source(config.dataset.clone()).err(),
            state.load_model(&config.model_path).err(),
        ]
        .into_iter()
        .flatten()
        .map(|e| e.to_string())
        .collect();
        if !errors.is_empty() {
            state.status_message = Some(format!("Error: {}", errors.join("; ")));
        }
        state
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.loader.as_ref().map(DatasetLoader::source)
    }

    /// Load `source` and reset the filters to its full ranges. Re-opening the
    /// current source reuses the cached dataset. A source that fails to load
    /// leaves the current source, dataset and filters in place.
    pub fn open_source(&mut self, source: DataSource) -> Result<()> {
        if let Some(current) = self.loader.as_ref().filter(|l| *l.source() == source) {
            return match current.load() {
                Ok(dataset) => {
                    self.set_dataset(dataset);
                    Ok(())
                }
                Err(e) => Err(self.load_failed(&source, e)),
            };
        }

        let loader = DatasetLoader::new(source, self.load_options.clone());
        match loader.load() {
            Ok(dataset) => {
                self.loader = Some(loader);
                self.set_dataset(dataset);
                Ok(())
            }
            Err(e) => Err(self.load_failed(loader.source(), e)),
        }
    }

    fn load_failed(&mut self, source: &DataSource, e: Error) -> Error {
        log::error!("Failed to load {source}: {e}");
        self.status_message = Some(format!("Error: {e}"));
        e
    }

    /// Ingest a loaded dataset and initialise the filters.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.extents = dataset.extents();
        if self.extents.is_none() {
            log::warn!("Loaded dataset has no records");
        }
        self.predicates = FilterPredicates::unconstrained(&dataset);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered records and the summary view.
    pub fn refilter(&mut self) {
        self.filtered = match &self.dataset {
            Some(ds) => filter::apply(ds, &self.predicates),
            None => Dataset::default(),
        };
        self.view = SummaryView::of(&self.filtered);
    }

    pub fn set_credit_limit_range(&mut self, lower: f64, upper: f64) -> Result<()> {
        self.predicates.credit_limit = Bounds::new(lower, upper)?;
        self.refilter();
        Ok(())
    }

    pub fn set_age_range(&mut self, lower: u32, upper: u32) -> Result<()> {
        self.predicates.age = Bounds::new(lower, upper)?;
        self.refilter();
        Ok(())
    }

    pub fn set_education(&mut self, education: CategoryFilter) {
        self.predicates.education = education;
        self.refilter();
    }

    pub fn set_sex(&mut self, sex: CategoryFilter) {
        self.predicates.sex = sex;
        self.refilter();
    }

    /// Back to the dataset's full ranges with no category constraint.
    pub fn reset_filters(&mut self) {
        self.predicates = match &self.dataset {
            Some(ds) => FilterPredicates::unconstrained(ds),
            None => FilterPredicates::everything(),
        };
        self.refilter();
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    pub fn load_model(&mut self, path: &Path) -> Result<()> {
        match ModelArtifact::load(path) {
            Ok(artifact) => {
                self.artifact = Some(Arc::new(artifact));
                self.status_message = None;
                self.predict();
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load model {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    pub fn set_profile(&mut self, profile: CustomerProfile) {
        self.profile = profile;
        self.predict();
    }

    /// Score the current form input. Without a model there is no prediction.
    pub fn predict(&mut self) {
        let Some(artifact) = &self.artifact else {
            self.prediction = None;
            return;
        };
        match predict_default_probability(artifact, &self.profile) {
            Ok(p) => self.prediction = Some(p),
            Err(e) => {
                log::error!("Scoring failed: {e}");
                self.prediction = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
