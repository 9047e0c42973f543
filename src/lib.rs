//! # testbin
//!
//! Pins the external binaries a build or test suite needs (etcd,
//! kube-apiserver, protoc, ...) and keeps an executable copy of each in a
//! local directory.
//!
//! For every configured binary:
//! - the installed copy is probed and left alone if it reports the pinned
//!   version
//! - otherwise the release URL is rendered for this platform and downloaded
//! - the artifact is sniffed (archive or bare executable)
//! - archives are searched with a list of layout heuristics
//! - the binary is installed with mode `0755`
//!
//! All binaries are handled concurrently and every failure is reported.
//!
//! ## Example
//!
//! ```no_run
//! use testbin::{AcquisitionConfig, BinarySpec};
//! use testbin::probe::CommandProbe;
//!
//! let config = AcquisitionConfig::new("testbin/bin")
//!     .binary(BinarySpec::new(
//!         "etcd",
//!         "3.5.9",
//!         "https://github.com/etcd-io/etcd/releases/download/v{{.Version}}/etcd-v{{.Version}}-{{.GOOS}}-{{.GOARCH}}.tar.gz",
//!         CommandProbe::new(),
//!     ))
//!     .binary(
//!         BinarySpec::new(
//!             "kube-apiserver",
//!             "1.29.3",
//!             "https://dl.k8s.io/v{{.Version}}/kubernetes-server-{{.GOOS}}-{{.GOARCH}}.tar.gz",
//!             CommandProbe::new(),
//!         )
//!         .path_in_archive("server/bin/kube-apiserver"),
//!     );
//!
//! testbin::run(&config).expect("test binaries");
//! ```
//!
//! ## Manifest
//!
//! The same configuration can live in a TOML file, see [`config::Manifest`]:
//!
//! ```no_run
//! let config = testbin::Manifest::load("testbin.toml")?.into_config()?;
//! testbin::run(&config)?;
//! # Ok::<(), testbin::Error>(())
//! ```
//!
//! ## Logging
//!
//! Progress is reported through the `log` facade; install a logger such as
//! `env_logger` to see it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod install;
pub mod orchestrator;
pub mod platform;
pub mod probe;
pub mod sniff;
pub mod template;
pub mod types;

pub use config::Manifest;
pub use error::{BinaryFailure, Error, ErrorCategory, Result};
pub use fetch::{Fetcher, HttpFetcher, MockFetcher};
pub use orchestrator::{Acquirer, run};
pub use platform::Platform;
pub use probe::{CommandProbe, VersionProbe};
pub use sniff::Sniffer;
pub use types::{
    AcquireReason, AcquisitionConfig, AcquisitionOutcome, AcquisitionReport, BinarySpec,
    DEFAULT_DIR, DetectedFileType,
};
