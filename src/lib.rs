//! # imgdedup
//!
//! Finds duplicate and near-duplicate images in a directory tree.
//!
//! The run is split into phases that can each be used on their own:
//!
//! - **Scan**: walk the tree and collect image paths ([`scanner`])
//! - **Hash**: decode, orient and fingerprint every image with a DCT-based
//!   perceptual hash on a worker pool ([`duplicates::batch`])
//! - **Cluster**: union-find over all pairs within a Hamming-distance
//!   threshold ([`duplicates::cluster`])
//! - **Plan**: pick a master per cluster and decide a move or delete for every
//!   other member ([`duplicates::resolver`])
//! - **Apply**: the only phase that touches the filesystem, run sequentially
//!   ([`cleaner`])
//! - **Report**: CSV report and contact sheets ([`report`])

pub mod cleaner;
pub mod cli;
pub mod common;
pub mod duplicates;
pub mod report;
pub mod scanner;
