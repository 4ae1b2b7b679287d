//! Declarative, compiled validation for plain Rust structs.
//!
//! Rules are attached to fields once per type through a fluent builder,
//! compiled into an immutable plan and then run against any number of
//! instances, from any number of threads. Every violated rule yields a
//! [`Violation`] with a localized message, the field's location and the
//! offending value; nothing short-circuits.
//!
//! # Quick start
//!
//! ```rust
//! use fieldguard::{Context, Validator};
//!
//! #[derive(Default)]
//! struct Sender {
//!     r#type: String,
//!     smtp_host: String,
//!     smtp_port: Option<u16>,
//!     templates: Vec<String>,
//! }
//!
//! fieldguard::structure! {
//!     Sender { r#type, smtp_host, smtp_port, templates }
//! }
//!
//! let validator = Validator::new();
//! validator.configure::<Sender, _>(|v, t| {
//!     v.string(&t.r#type).required().any_of(["SMTP", "HTTP"]);
//!     let smtp = v.when(|s: &Sender| s.r#type == "SMTP");
//!     smtp.string(&t.smtp_host).trim().required();
//!     smtp.number(&t.smtp_port).required().any_of_interval(0, 65_535);
//!     v.string(&t.templates).regexp("[a-zA-Z0-9.]+", &[]);
//! });
//!
//! let mut sender = Sender {
//!     r#type: "SMTP".to_owned(),
//!     smtp_host: "  ".to_owned(),
//!     smtp_port: Some(25),
//!     templates: vec!["welcome.html".to_owned()],
//! };
//! let violations = validator.validate(&Context::new(), &mut sender);
//! assert_eq!(violations.len(), 1);
//! assert_eq!(violations[0].location(), "smtp_host");
//! assert_eq!(violations[0].message(), "value is required");
//! ```
//!
//! # Describing structs
//!
//! Rust has no runtime reflection, so each validated struct lists its
//! fields once with [`structure!`]. Rules are then attached by handing the
//! builder a reference into the template it passes to the configure
//! closure; the reference is resolved to a field by address and type.
//!
//! # Messages
//!
//! Rules emit locale keys such as `validation:string:required`. The
//! default [`Catalog`] ships English messages; add more languages with
//! [`Catalog::add_json`] and pass a [`Context`] carrying the caller's
//! preferred languages, e.g. from an `Accept-Language` header.
//!
//! # Error types
//!
//! | Type | When |
//! |------|------|
//! | [`ConfigError`] | Rules were configured incorrectly |
//! | [`ValidationError`] | [`Validator::check`] found violations |
//! | [`CatalogError`] | A message catalog document could not be loaded |

#![warn(missing_docs)]

mod config;
mod context;
mod error;
mod helper;
mod i18n;
mod structure;
mod validator;
mod violation;

pub use config::{FieldNaming, ValidatorOption};
pub use context::{Context, parse_accept_language};
pub use error::{CatalogError, ConfigError, ValidationError};
pub use helper::Helper;
pub use i18n::{Catalog, DEFAULT_LANGUAGE, Translator, format_message};
pub use structure::{Indirect, Member, Structure, zero};
pub use validator::rules::{
    Holder, Number, NumberRules, PatternOption, Scalar, StringRules, UuidRules,
};
pub use validator::{Builder, FieldDescriptor, FieldPath, Validator};
pub use violation::{FieldValue, Violation};
