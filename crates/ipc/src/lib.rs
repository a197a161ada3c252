//! IPC message protocol for the avatar builder
//!
//! Defines the message types exchanged between the wardrobe core (hosted by
//! the Bevy adapter) and whichever UI drives it. Messages are JSON encoded
//! with an adjacent `type`/`data` tag.

mod commands;
mod error;
mod messages;
mod types;

pub use commands::*;
pub use error::IpcError;
pub use messages::{CoreToUi, UiToCore};
pub use types::*;

/// Encode an outbound message as a single JSON line
pub fn encode_message(message: &CoreToUi) -> Result<String, IpcError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode one inbound JSON message
pub fn decode_message(text: &str) -> Result<UiToCore, IpcError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(IpcError::InvalidFormat("empty message".to_string()));
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_request_wire_shape() {
        let msg = decode_message(r#"{"type":"LoadAsset","data":{"kind":"hat","name":"Crown"}}"#).unwrap();
        match msg {
            UiToCore::LoadAsset { kind, name } => {
                assert_eq!(kind, AssetKind::Hat);
                assert_eq!(name, "Crown");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_nested_command_wire_shape() {
        let msg = decode_message(r#"{"type":"HistoryCommand","data":"Undo"}"#).unwrap();
        assert!(matches!(msg, UiToCore::HistoryCommand(HistoryCommand::Undo)));

        let msg = decode_message(r#"{"type":"GizmoCommand","data":{"SetMode":"Rotate"}}"#).unwrap();
        assert!(matches!(msg, UiToCore::GizmoCommand(GizmoCommand::SetMode(GizmoMode::Rotate))));
    }

    #[test]
    fn test_outbound_encoding() {
        let json = encode_message(&CoreToUi::RemoveAvailabilityChanged {
            category: WearableCategory::Shirt,
            enabled: true,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"RemoveAvailabilityChanged","data":{"category":"shirt","enabled":true}}"#
        );
    }

    #[test]
    fn test_custom_load_and_randomize_wire_shape() {
        let msg = decode_message(r#"{"type":"LoadCustom","data":{"path":"/tmp/My Fox.glb"}}"#).unwrap();
        assert_eq!(
            msg,
            UiToCore::LoadCustom {
                path: "/tmp/My Fox.glb".to_string()
            }
        );
        assert_eq!(decode_message(r#"{"type":"Randomize"}"#).unwrap(), UiToCore::Randomize);
    }

    #[test]
    fn test_empty_message_rejected() {
        assert!(matches!(decode_message("   "), Err(IpcError::InvalidFormat(_))));
        assert!(matches!(decode_message("{"), Err(IpcError::Serialize(_))));
    }
}
