//! The seam a shadowing entity reaches through for bridge-owned
//! operations it cannot itself implement.

use josh_core::GeoKey;
use josh_handler::HandlerError;
use josh_units::Value;

/// Entity creation and spatial-query execution (`spec.md` §4.D's
/// `createEntity`/`executeSpatialQuery` ops) require reaching outside
/// the shadowing layer into the engine bridge and its query cache
/// (§4.E, §4.G). `josh-shadow` depends on neither crate; instead a
/// bridge implements this trait and is handed to shadowing entities at
/// construction, mirroring how `josh-handler`'s own [`josh_handler::Scope`]
/// decouples compiled-handler execution from this crate.
///
/// Both methods take `origin`, the `GeoKey` of the entity currently
/// being evaluated — "near the entity currently being evaluated" and
/// "within `distance` of the entity currently being evaluated"
/// (`spec.md` §4.D) require a center point the shadowing layer holds
/// but the bridge does not.
pub trait SpatialSupport {
    /// Instantiate `count` entities of the named prototype near
    /// `origin`.
    fn create_entities(
        &self,
        type_name: &str,
        count: i64,
        origin: Option<&GeoKey>,
    ) -> Result<Value, HandlerError>;

    /// Execute a spatial query for `attribute` within `distance` of
    /// `origin`.
    fn execute_spatial_query(
        &self,
        attribute: &str,
        distance: &Value,
        origin: Option<&GeoKey>,
    ) -> Result<Value, HandlerError>;
}
