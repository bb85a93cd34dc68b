//! Convenient re-exports of commonly used baasday types.
//!
//! ```ignore
//! use baasday::prelude::*;
//! ```
//!
//! This brings the document facades, the capability traits their `update`
//! and `delete` come from, the query and update builders, and the field
//! accessors into scope.

pub use baasday_core::{
    client::ApiClient,
    config::ClientConfig,
    document::{Deletable, Document, DocumentFactory, Identifiable, Resource, Updatable},
    error::{BaasdayError, BaasdayResult, ErrorKind},
    list::ListResult,
    query::{Expr, Filter, Query, QueryBuilder, Sort, SortDirection},
    transport::{Transport, TransportBuilder},
    update::Update,
    value::{FieldAccess, Number, Value, ValueMap},
    value_map,
};

pub use crate::{
    device::{Device, generate_device_id},
    item::Item,
    leaderboard::LeaderboardEntry,
    user::{AuthenticatedUser, User},
};
