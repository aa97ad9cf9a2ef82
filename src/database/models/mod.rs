pub mod department;
pub mod project;
pub mod forecast_month;
pub mod snapshot;


pub use department::Department;
pub use project::Project;
pub use forecast_month::{ForecastMonth, LineDetails, NewForecastMonth};
pub use snapshot::{SnapshotHeader, SnapshotMonth};
