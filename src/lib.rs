pub mod bbox;
pub mod binder;
pub mod error;
pub mod extract;
pub mod host;
pub mod interval;
pub mod numeric;
pub mod object;
pub mod operator;
pub mod pose;
pub mod registry;
pub mod report;
pub mod scene;
pub mod weights;
pub mod json_structs;
pub mod json_parser;

pub mod prelude;

pub use error::{CageError, CageResult};
pub use host::SceneHost;
pub use operator::{CageParams, CageState, LatticeCreateOperator};
pub use registry::{Command, CommandRegistry, Status};
pub use scene::Scene;
