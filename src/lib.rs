//! # rapidgator-upload
//!
//! Rust client for uploading files to the Rapidgator file-hosting service.
//!
//! This crate provides:
//! - Session login against the account API
//! - Content-addressed dedup probing (MD5 + size), skipping transfers the
//!   service does not need
//! - Streaming multipart uploads from memory or from disk
//! - Resolution of the final public download link
//!
//! ## Example
//!
//! ```no_run
//! use rapidgator_upload::{Client, Credentials, Upload};
//!
//! let credentials = Credentials::new("user@example.com", "secret").unwrap();
//! let mut client = Client::new(credentials);
//! client.authenticate().unwrap();
//!
//! // Upload from memory
//! let url = client
//!     .upload(Upload::buffer("hello.txt", b"Hello, World!".to_vec()))
//!     .unwrap();
//! println!("{}", url);
//!
//! // Upload a file from disk into folder 42
//! let url = client
//!     .upload(Upload::file("backup.tar", "/var/backups/backup.tar").folder(42))
//!     .unwrap();
//! println!("{}", url);
//! ```

mod api;
mod client;
mod error;
mod hash;
mod multipart;
mod source;

pub use api::{PendingUpload, PreparedUpload};
pub use client::{Client, Credentials, SessionId, DEFAULT_BASE_URL, LOGIN_ENV, PASSWORD_ENV};
pub use error::{Cause, Error, ErrorKind, Result};
pub use hash::ContentHash;
pub use multipart::MultipartForm;
pub use source::{ContentDescriptor, ContentSource, Upload};
