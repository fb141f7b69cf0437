pub mod batch;
pub mod cluster;
pub mod distance;
pub mod grouper;
pub mod loader;
pub mod perceptual;
pub mod record;
pub mod resolver;

pub use distance::{hamming_distance, threshold_from_similarity};
pub use grouper::{analyze, find_duplicates, Analysis, DupResults};
pub use perceptual::{Fingerprint, HashParams, PerceptualHasher};
pub use record::{Action, Cluster, ClusterKind, DispositionRecord, ImageRecord};
pub use resolver::{plan_actions, select_master, Plan, PlanOptions};
