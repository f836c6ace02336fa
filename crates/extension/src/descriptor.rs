//! Registration descriptor: the metadata the host catalog renders.
//!
//! [`ExtensionInfo::for_locale`] produces the extension's identity, its four
//! block descriptors, and the slot menu, with block texts translated for the
//! requested locale. The structure serialises to the camelCase JSON shape the
//! host expects.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::commands::{args, OPCODE_CLEAR, OPCODE_INIT, OPCODE_SEND, OPCODE_SET_DATA};
use crate::{Slot, PLACEHOLDER_CHANNEL_ID, PLACEHOLDER_WRITE_KEY};

/// Extension id registered with the host.
pub const EXTENSION_ID: &str = "ambient";

/// Where the host loads the extension module from.
pub const EXTENSION_URL: &str = "https://610t.github.io/ambient/dist/ambient.mjs";

/// Documentation page linked from the catalog entry.
pub const HELP_LINK: &str = "https://610t.github.io/ambient/";

/// Name of the slot menu referenced by the `setData` block.
pub const DATA_MENU: &str = "dataMenu";

// ---------------------------------------------------------------------------
// Translations
// ---------------------------------------------------------------------------

/// Locales with a translation table. Anything else falls back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Ja,
}

impl Locale {
    /// Resolves a BCP 47 tag (`"ja"`, `"ja-JP"`, `"en-US"`) by its language subtag.
    pub fn from_tag(tag: &str) -> Self {
        let language = tag.split(['-', '_']).next().unwrap_or_default();
        if language.eq_ignore_ascii_case("ja") {
            Locale::Ja
        } else {
            Locale::En
        }
    }
}

/// (message id, English, Japanese)
const MESSAGES: &[(&str, &str, &str)] = &[
    ("ambient.name", "Ambient", "Ambient"),
    (
        "ambient.entry.description",
        "an extension for Xcratch",
        "Xcratch の拡張機能",
    ),
    (
        "ambient.init",
        "Init Channel ID: [CHANNELID] Write Key: [WRITEKEY]",
        "チャネルID: [CHANNELID] ライトキー: [WRITEKEY] で初期化する",
    ),
    ("ambient.setData", "Set [DATA] to [VALUE]", "[DATA] を [VALUE] にする"),
    ("ambient.send", "Send data", "データを送信する"),
    ("ambient.clear", "Clear data", "データを消去する"),
];

/// Looks up a message id, returning `None` for ids without a translation.
pub fn message(id: &str, locale: Locale) -> Option<&'static str> {
    MESSAGES
        .iter()
        .find(|(key, _, _)| *key == id)
        .map(|(_, en, ja)| match locale {
            Locale::En => *en,
            Locale::Ja => *ja,
        })
}

fn text(id: &str, locale: Locale) -> String {
    message(id, locale).unwrap_or(id).to_string()
}

// ---------------------------------------------------------------------------
// Descriptor types
// ---------------------------------------------------------------------------

/// Kind of block. Every block of this extension is a command (no reporters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Command,
}

/// Declared type of a block argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    String,
    Number,
}

/// One argument slot on a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgumentInfo {
    #[serde(rename = "type")]
    pub kind: ArgumentType,
    pub default_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu: Option<&'static str>,
}

/// One block as presented in the palette.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub opcode: &'static str,
    pub block_type: BlockType,
    pub block_all_threads: bool,
    /// Translated label with `[ARGUMENT]` placeholders.
    pub text: String,
    pub func: &'static str,
    pub arguments: BTreeMap<&'static str, ArgumentInfo>,
}

/// A drop-down menu referenced by block arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuInfo {
    pub accept_reporters: bool,
    pub items: Vec<&'static str>,
}

/// Everything the host needs to list and render the extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionInfo {
    pub id: &'static str,
    pub name: String,
    pub description: String,
    pub extension_url: &'static str,
    pub help_link: &'static str,
    pub collaborator: &'static str,
    pub featured: bool,
    pub internet_connection_required: bool,
    pub show_status_button: bool,
    pub blocks: Vec<BlockInfo>,
    pub menus: BTreeMap<&'static str, MenuInfo>,
}

impl ExtensionInfo {
    /// Builds the descriptor with texts in `locale`.
    pub fn for_locale(locale: Locale) -> Self {
        let command = |opcode: &'static str, message_id: &str, arguments| BlockInfo {
            opcode,
            block_type: BlockType::Command,
            block_all_threads: false,
            text: text(message_id, locale),
            func: opcode,
            arguments,
        };

        let init_args = BTreeMap::from([
            (
                args::CHANNEL_ID,
                ArgumentInfo {
                    kind: ArgumentType::String,
                    default_value: Value::from(PLACEHOLDER_CHANNEL_ID),
                    menu: None,
                },
            ),
            (
                args::WRITE_KEY,
                ArgumentInfo {
                    kind: ArgumentType::String,
                    default_value: Value::from(PLACEHOLDER_WRITE_KEY),
                    menu: None,
                },
            ),
        ]);
        let set_data_args = BTreeMap::from([
            (
                args::DATA,
                ArgumentInfo {
                    kind: ArgumentType::String,
                    default_value: Value::from(Slot::D1.label()),
                    menu: Some(DATA_MENU),
                },
            ),
            (
                args::VALUE,
                ArgumentInfo {
                    kind: ArgumentType::Number,
                    default_value: Value::from(0),
                    menu: None,
                },
            ),
        ]);

        Self {
            id: EXTENSION_ID,
            name: text("ambient.name", locale),
            description: text("ambient.entry.description", locale),
            extension_url: EXTENSION_URL,
            help_link: HELP_LINK,
            collaborator: "610t",
            featured: true,
            internet_connection_required: false,
            show_status_button: false,
            blocks: vec![
                command(OPCODE_INIT, "ambient.init", init_args),
                command(OPCODE_SET_DATA, "ambient.setData", set_data_args),
                command(OPCODE_SEND, "ambient.send", BTreeMap::new()),
                command(OPCODE_CLEAR, "ambient.clear", BTreeMap::new()),
            ],
            menus: BTreeMap::from([(
                DATA_MENU,
                MenuInfo {
                    accept_reporters: false,
                    items: Slot::ALL.iter().map(|slot| slot.label()).collect(),
                },
            )]),
        }
    }
}
