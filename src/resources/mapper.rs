//! Mapping of decoded service payloads onto resource types.
//!
//! Failure sentinels and bare strings are never wrapped: they come back as
//! [`Outcome::Failed`] / [`Outcome::Text`] and callers check for them before
//! using the result as a resource.

use super::{Algorithm, FromPayload, Prediction, Resource, ResourceKind, Task, Version};
use crate::client::Client;
use crate::types::Outcome;
use crate::{Error, ErrorContext, Result};
use serde_json::{Map, Value};

/// Map one payload onto the resource type selected by `kind`.
pub fn map_one(kind: ResourceKind, decoded: Outcome<Value>, client: &Client) -> Result<Outcome<Resource>> {
    Ok(match kind {
        ResourceKind::Algorithm => map_as::<Algorithm>(decoded, client)?.map(Resource::Algorithm),
        ResourceKind::Version => map_as::<Version>(decoded, client)?.map(Resource::Version),
        ResourceKind::Task => map_as::<Task>(decoded, client)?.map(Resource::Task),
        ResourceKind::Prediction => map_as::<Prediction>(decoded, client)?.map(Resource::Prediction),
    })
}

/// Map a list payload, preserving order. An element that cannot be built
/// fails the whole call.
pub fn map_many(kind: ResourceKind, decoded: Outcome<Value>, client: &Client) -> Result<Outcome<Vec<Resource>>> {
    Ok(match kind {
        ResourceKind::Algorithm => {
            map_all_as::<Algorithm>(decoded, client)?.map(|v| v.into_iter().map(Resource::Algorithm).collect())
        }
        ResourceKind::Version => {
            map_all_as::<Version>(decoded, client)?.map(|v| v.into_iter().map(Resource::Version).collect())
        }
        ResourceKind::Task => {
            map_all_as::<Task>(decoded, client)?.map(|v| v.into_iter().map(Resource::Task).collect())
        }
        ResourceKind::Prediction => {
            map_all_as::<Prediction>(decoded, client)?.map(|v| v.into_iter().map(Resource::Prediction).collect())
        }
    })
}

pub fn map_as<T: FromPayload>(decoded: Outcome<Value>, client: &Client) -> Result<Outcome<T>> {
    match decoded {
        Outcome::Failed => Ok(Outcome::Failed),
        Outcome::Text(s) | Outcome::Resource(Value::String(s)) => Ok(Outcome::Text(s)),
        Outcome::Resource(value) => Ok(Outcome::Resource(T::from_payload(
            single_object(value),
            client,
        )?)),
    }
}

pub fn map_all_as<T: FromPayload>(decoded: Outcome<Value>, client: &Client) -> Result<Outcome<Vec<T>>> {
    let items = match decoded {
        Outcome::Failed => return Ok(Outcome::Failed),
        Outcome::Text(s) | Outcome::Resource(Value::String(s)) => return Ok(Outcome::Text(s)),
        Outcome::Resource(Value::Array(items)) => items,
        Outcome::Resource(Value::Null) => Vec::new(),
        Outcome::Resource(obj @ Value::Object(_)) => vec![obj],
        Outcome::Resource(other) => {
            return Err(Error::validation_with_context(
                format!("expected a list of {:?} payloads", T::KIND),
                ErrorContext::new()
                    .with_details(format!("got {}", other))
                    .with_source("resource_mapper"),
            ))
        }
    };

    items
        .into_iter()
        .map(|item| T::from_payload(single_object(item), client))
        .collect::<Result<Vec<_>>>()
        .map(Outcome::Resource)
}

/// The object a single resource is built from: the payload itself, the first
/// element of a list, or an empty map.
fn single_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Array(items) => items
            .into_iter()
            .next()
            .map(single_object)
            .unwrap_or_default(),
        _ => Map::new(),
    }
}
