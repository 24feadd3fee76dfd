//! `reclink-output`: reporting and persistence for linkage/deduplication results.
//!
//! Receives weight vectors and classification sets produced upstream, returns
//! histogram reports and writes match-status files and annotated datasets.
//! Dataset formats live in `reclink-io`.

pub mod annotate;
pub mod classification;
pub mod config;
pub mod engine;
pub mod error;
pub mod histogram;
pub mod match_id;
pub mod model;
pub mod status;
pub mod weights;

pub use annotate::{save_match_datasets, write_annotated, AugmentedSchema, DatasetTarget};
pub use classification::ClassificationPartition;
pub use config::JobConfig;
pub use engine::run;
pub use error::OutputError;
pub use histogram::generate_histogram;
pub use match_id::{assign, MatchId, Membership, MembershipIndex};
pub use model::{LinkMode, RecordIdPair, WeightVectorMap};
pub use status::save_match_status;
pub use weights::{load_weight_vectors, save_weight_vectors, WeightVectorFile};
