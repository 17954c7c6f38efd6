pub mod animation;
pub mod constants;
pub mod environment;
pub mod page;
pub mod page_manager;
pub mod particulate;

pub use animation::CatAnimation;
pub use environment::{EnvironmentLevelsPage, EnvironmentValuesPage};
pub use page::{Acquisition, Page, PageId, PageWrapper};
pub use page_manager::PageManager;
pub use particulate::{ParticulateLevelsPage, ParticulateValuesPage};
