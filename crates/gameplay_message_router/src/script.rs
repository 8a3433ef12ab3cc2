//! Scripting boundary.
//!
//! Script-defined message types (see [`MessageType::dynamic`]) carry
//! `serde_json::Value` payloads. This module lets script glue broadcast such
//! payloads, register listeners for them, and move data between the JSON
//! payload and typed Rust values.

use crate::context::MessageContext;
use crate::error::RouterError;
use crate::message::{MessageType, Payload};
use crate::spatial::SpatialMessageRouter;
use crate::system::{ListenerHandle, ListenerOptions, MessageCallback, MessageRouter};
use crate::tag::ChannelTag;
use crate::types::{BroadcastResult, TargetId, Vec3};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

const JSON_PAYLOAD: &str = "serde_json::Value";

impl Payload<'_> {
    /// Copies a JSON payload out into a typed value.
    ///
    /// Fails with [`RouterError::TypeMismatch`] if the payload is not JSON and
    /// with [`RouterError::Serialization`] if it does not deserialize into `T`.
    pub fn read_json<T: DeserializeOwned>(&self) -> Result<T, RouterError> {
        let value = self.get::<Value>().ok_or_else(|| self.json_mismatch())?;
        Ok(T::deserialize(value)?)
    }

    /// Replaces a JSON payload with the serialized form of `value`. Listeners
    /// after the current one observe the replacement.
    pub fn override_json<T: Serialize>(&mut self, value: &T) -> Result<(), RouterError> {
        let replacement = serde_json::to_value(value)?;
        match self.get_mut::<Value>() {
            Some(slot) => {
                *slot = replacement;
                Ok(())
            }
            None => Err(self.json_mismatch()),
        }
    }

    fn json_mismatch(&self) -> RouterError {
        RouterError::TypeMismatch {
            expected: JSON_PAYLOAD.to_string(),
            found: self.as_message().message_type_name().to_string(),
        }
    }
}

fn check_script_type(message_type: &MessageType) -> Result<(), RouterError> {
    if !message_type.is_dynamic() {
        return Err(RouterError::TypeMismatch {
            expected: JSON_PAYLOAD.to_string(),
            found: message_type.payload_type_name().to_string(),
        });
    }
    if !message_type.is_valid() {
        return Err(RouterError::StaleMessageType(message_type.name().to_string()));
    }
    Ok(())
}

fn json_callback<F>(callback: F) -> MessageCallback
where
    F: Fn(&mut MessageContext<'_>, &mut Value) + Send + Sync + 'static,
{
    Arc::new(move |ctx: &mut MessageContext<'_>, payload: &mut Payload<'_>| {
        if let Some(value) = payload.get_mut::<Value>() {
            callback(ctx, value);
        }
    })
}

impl MessageRouter {
    /// Registers a listener for a script-defined message type. The callback
    /// may edit the JSON payload in place.
    pub fn register_script<F>(
        &self,
        message_type: &MessageType,
        channel: impl Into<ChannelTag>,
        options: ListenerOptions,
        callback: F,
    ) -> Result<ListenerHandle, RouterError>
    where
        F: Fn(&mut MessageContext<'_>, &mut Value) + Send + Sync + 'static,
    {
        check_script_type(message_type)?;
        Ok(self.register_raw(message_type, channel, options, json_callback(callback)))
    }

    /// Broadcasts a JSON payload of a script-defined message type.
    ///
    /// # Errors
    ///
    /// [`RouterError::TypeMismatch`] for native message types and
    /// [`RouterError::StaleMessageType`] for retired ones.
    pub fn broadcast_script(
        &self,
        channel: &ChannelTag,
        message_type: &MessageType,
        payload: &mut Value,
        target: Option<TargetId>,
    ) -> Result<BroadcastResult, RouterError> {
        check_script_type(message_type)?;
        Ok(self.broadcast_raw(channel, message_type, payload, target))
    }
}

impl SpatialMessageRouter {
    /// Registers a spatial listener for a script-defined message type.
    pub fn register_script_at<F>(
        &self,
        message_type: &MessageType,
        channel: impl Into<ChannelTag>,
        position: Vec3,
        radius: f64,
        options: ListenerOptions,
        callback: F,
    ) -> Result<ListenerHandle, RouterError>
    where
        F: Fn(&mut MessageContext<'_>, &mut Value) + Send + Sync + 'static,
    {
        check_script_type(message_type)?;
        Ok(self.register_raw_at(
            message_type,
            channel,
            position,
            radius,
            options,
            json_callback(callback),
        ))
    }

    /// Broadcasts a JSON payload of a script-defined message type at `position`.
    pub fn broadcast_script_at(
        &self,
        channel: &ChannelTag,
        message_type: &MessageType,
        payload: &mut Value,
        position: Vec3,
        target: Option<TargetId>,
    ) -> Result<BroadcastResult, RouterError> {
        check_script_type(message_type)?;
        Ok(self.broadcast_raw_at(channel, message_type, payload, position, target))
    }
}
