//! Serializable views handed to the command line.

use serde::{Deserialize, Serialize};

use super::display::DisplayState;
use super::labels::LabelMap;
use super::space::SpaceId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceData {
    pub space_id: Option<SpaceId>,
    pub label: Option<String>,
    pub display_text: String,
    pub is_labeled: bool,
}

impl SpaceData {
    pub fn new(state: &DisplayState, label: Option<String>) -> Self {
        Self {
            space_id: state.space,
            label,
            display_text: state.text.clone(),
            is_labeled: state.labeled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelData {
    /// Persisted key. Normally a decimal [`SpaceId`], but the store does not
    /// enforce that.
    pub space_id: String,
    pub label: String,
}

pub fn label_list(map: LabelMap) -> Vec<LabelData> {
    let mut labels: Vec<_> = map
        .into_iter()
        .map(|(space_id, label)| LabelData { space_id, label })
        .collect();
    // Numeric keys in numeric order, anything else after them.
    labels.sort_by_key(|data| {
        (data.space_id.parse::<u64>().unwrap_or(u64::MAX), data.space_id.clone())
    });
    labels
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::display::DisplayOptions;

    #[test]
    fn label_list_orders_numerically() {
        let map = LabelMap::from([
            ("100".to_owned(), "c".to_owned()),
            ("9".to_owned(), "a".to_owned()),
            ("junk".to_owned(), "z".to_owned()),
            ("12".to_owned(), "b".to_owned()),
        ]);
        let ids: Vec<_> = label_list(map).into_iter().map(|d| d.space_id).collect();
        assert_eq!(ids, ["9", "12", "100", "junk"]);
    }

    #[test]
    fn space_data_serializes_flat() {
        let state = DisplayState::resolve(
            Some(SpaceId::new(42)),
            Some("Dev".to_owned()),
            DisplayOptions::default(),
        );
        let json = serde_json::to_value(SpaceData::new(&state, Some("Dev".to_owned()))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "space_id": 42,
                "label": "Dev",
                "display_text": "DEV",
                "is_labeled": true,
            })
        );
    }
}
