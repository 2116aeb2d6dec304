pub mod codec;
pub mod error;
pub mod locks;
pub mod model;
pub mod store;

pub use error::{ConfigStoreError, LoadWarning};
pub use model::{ConfigurationBundle, FilterConfiguration, MAX_CONFIGURATIONS};
pub use store::{ConfigListing, ConfigStore, NewConfiguration, StoreOptions};
