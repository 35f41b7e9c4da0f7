//! # Command Registry
//!
//! Static table of every parameter the WR3223 controller answers to. Each
//! entry carries the 2-character code, a description, an optional unit, the
//! writability flag and, for enumerated parameters, a mapping from the raw
//! value string to a label.
//!
//! Mapping keys are compared as exact strings. The controller encodes
//! enumerations as decimal numbers with a trailing point (`"3."`, `"-125."`),
//! and the same raw string can mean different things under different codes
//! (`"-47."` under `Tf` and `RL`), so every command owns its own table.
//!
//! ```rust
//! use wr3223_rs::registry::{lookup, map_label};
//!
//! assert_eq!(lookup("T3").unwrap().description, "Aussentemperatur");
//! assert_eq!(map_label("MD", "3."), Some("Winter: WP aus"));
//! assert_eq!(map_label("MD", "99."), None);
//! ```

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// A single readable (and possibly writable) controller parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub code: &'static str,
    pub description: &'static str,
    pub unit: Option<&'static str>,
    pub writable: bool,
    /// Ordered raw value -> label pairs. Empty when the value is not enumerated.
    pub mapping: &'static [(&'static str, &'static str)],
}

impl CommandSpec {
    const fn read_only(code: &'static str, description: &'static str, unit: Option<&'static str>) -> Self {
        CommandSpec {
            code,
            description,
            unit,
            writable: false,
            mapping: &[],
        }
    }

    const fn writable(code: &'static str, description: &'static str, unit: Option<&'static str>) -> Self {
        CommandSpec {
            code,
            description,
            unit,
            writable: true,
            mapping: &[],
        }
    }

    const fn mapped(
        code: &'static str,
        description: &'static str,
        mapping: &'static [(&'static str, &'static str)],
    ) -> Self {
        CommandSpec {
            code,
            description,
            unit: None,
            writable: false,
            mapping,
        }
    }

    /// Whether raw values of this command are enumerated.
    pub fn has_mapping(&self) -> bool {
        !self.mapping.is_empty()
    }

    /// Label for `raw`, matched by exact string equality.
    pub fn label_for(&self, raw: &str) -> Option<&'static str> {
        self.mapping
            .iter()
            .find(|(key, _)| *key == raw)
            .map(|(_, label)| *label)
    }

    /// The unit, or an empty string when the value has none.
    pub fn unit_or_empty(&self) -> &'static str {
        self.unit.unwrap_or("")
    }
}

const CELSIUS: Option<&str> = Some("[°C]");
const PERCENT: Option<&str> = Some("[%]");
const MINUTES: Option<&str> = Some("min");

const AIR_LEVELS: &[(&str, &str)] = &[
    ("0.", "Aus"),
    ("1.", "Stufe 1"),
    ("2.", "Stufe 2"),
    ("3.", "Stufe 3"),
];

const MODES: &[(&str, &str)] = &[
    ("0.", "Aus"),
    ("1.", "Sommer"),
    ("2.", "Abluft"),
    ("3.", "Winter: WP aus"),
    ("-125.", "Winter: WP an"),
    ("4.", "Handbetrieb"),
];

const ERRORS: &[(&str, &str)] = &[
    ("0.", "Keine Meldung"),
    ("4.", "Hochdruck"),
    ("11.", "Kurzschluss an T1"),
    ("12.", "Kurzschluss an T2"),
    ("13.", "Kurzschluss an T3"),
    ("15.", "Kurzschluss an T5"),
    ("21.", "Offene Leitung an T1"),
    ("22.", "Offene Leitung an T2"),
    ("23.", "Offene Leitung an T3"),
    ("25.", "Offenen Leitung an T5"),
];

const STATUS: &[(&str, &str)] = &[
    ("217.", "Wärmepumpe aktiv?"),
    ("249.", "Wärmepumpe inaktiv?"),
];

const UTILITY_LOCK: &[(&str, &str)] = &[("-47.", "Aktiv"), ("-48.", "Inaktiv")];

const RELAYS: &[(&str, &str)] = &[
    ("-47.", "Zustand?"),
    ("64.", "EVU?"),
    ("320.", "Freigabe(WP/Kühl):Ja   | WP:Aus | Kühl:Aus | Freigabe(ZH):Nein | Bypass:Nein"),
    ("321.", "Freigabe(WP/Kühl):Nein | WP:Aus | Kühl:Aus | Freigabe(ZH):Nein | Bypass:Nein"),
    ("322.", "Freigabe(WP/Kühl):Ja   | WP:Aus | Kühl:Aus | Freigabe(ZH):Ja   | Bypass:Nein"),
    ("328.", "Freigabe(WP/Kühl):Nein | WP:Aus | Kühl:Aus | Freigabe(ZH):Nein | Bypass:Ja"),
    ("833.", "Freigabe(WP/Kühl):Ja   | WP:An  | Kühl:Aus | Freigabe(ZH):Nein | Bypass:Nein"),
    ("835.", "Freigabe(WP/Kühl):Ja   | WP:An  | Kühl:Aus | Freigabe(ZH):Ja   | Bypass:Nein"),
    ("2377.", "Freigabe(WP/Kühl):Ja   | WP:Aus | Kühl:An  | Freigabe(ZH):Nein | Bypass:Ja"),
];

/// Every command the controller knows, in registration order.
pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::read_only("T1", "Temperatur Verdampfer", CELSIUS),
    CommandSpec::read_only("T2", "Temperatur Kondensator", CELSIUS),
    CommandSpec::read_only("T3", "Aussentemperatur", CELSIUS),
    CommandSpec::read_only("T4", "Temperatur Abluft (Raumtemperatur)", CELSIUS),
    CommandSpec::read_only("T5", "Temperatur nach Wärmetauscher (Fortluft)", CELSIUS),
    CommandSpec::read_only("T6", "Zulufttemperatur", CELSIUS),
    CommandSpec::read_only("T7", "Temperatur nach Solevorerwärmung", CELSIUS),
    CommandSpec::read_only("T8", "Temperatur nach Wärmetauscher", CELSIUS),
    CommandSpec::read_only("UZ", "Spannung Ventilator Zuluft", Some("[0.1 V]")),
    CommandSpec::read_only("UA", "Spannung Ventilator Abluft", Some("[0.1 V]")),
    CommandSpec::read_only("NZ", "Drehzahl Zuluft", Some("[U/min]")),
    CommandSpec::read_only("NA", "Drehzahl Abluft", Some("[U/min]")),
    CommandSpec::mapped("LS", "Luftstufe", AIR_LEVELS),
    CommandSpec::writable("L1", "Luftstufe 1", PERCENT),
    CommandSpec::writable("L2", "Luftstufe 2", PERCENT),
    CommandSpec::writable("L3", "Luftstufe 3", PERCENT),
    CommandSpec::writable("LD", "Luftdifferenz Zuluft", PERCENT),
    CommandSpec::writable("Ld", "Luftdifferenz Abluft", PERCENT),
    CommandSpec::writable("ES", "EWT Sommer", CELSIUS),
    CommandSpec::writable("EW", "EWT Winter", CELSIUS),
    CommandSpec::writable("KM", "Maximale Kondensationstemperatur", CELSIUS),
    CommandSpec::read_only("PA", "Ausgleichszeit", Some("[Sek.]")),
    CommandSpec::writable("ZH", "Zusatzheizung frei", None),
    CommandSpec::writable("ZE", "Zusatzheizung Ein", None),
    CommandSpec::read_only("WP", "Wärmepumpe freigegeben", None),
    CommandSpec::mapped("MD", "Mode", MODES),
    CommandSpec::writable("AE", "Abtau ein", CELSIUS),
    CommandSpec::writable("AA", "Abtau aus", CELSIUS),
    CommandSpec::writable("Az", "Luftstufe Abtau", None),
    CommandSpec::writable("AP", "Abtaupause", MINUTES),
    CommandSpec::writable("AN", "Abtaunachlauf", MINUTES),
    CommandSpec::mapped("ER", "Fehlermeldung", ERRORS),
    CommandSpec::mapped("ST", "Status", STATUS),
    CommandSpec::mapped("Tf", "EVU Sperre", UTILITY_LOCK),
    CommandSpec::mapped("RL", "Relais", RELAYS),
    CommandSpec::read_only("II", "Identifikation lesen", Some("[Text]")),
];

static INDEX: Lazy<HashMap<&'static str, &'static CommandSpec>> =
    Lazy::new(|| COMMANDS.iter().map(|spec| (spec.code, spec)).collect());

static SORTED_CODES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut codes: Vec<&'static str> = COMMANDS.iter().map(|spec| spec.code).collect();
    codes.sort_unstable();
    codes
});

/// Looks up a command by its exact (case-sensitive) code.
pub fn lookup(code: &str) -> Option<&'static CommandSpec> {
    INDEX.get(code).copied()
}

/// Whether `code` is registered.
pub fn contains(code: &str) -> bool {
    INDEX.contains_key(code)
}

/// All registered codes, sorted. The list is built once and never changes.
pub fn all_codes() -> &'static [&'static str] {
    &SORTED_CODES
}

/// Every registered command in registration order.
pub fn commands() -> &'static [CommandSpec] {
    COMMANDS
}

/// Returns the label configured for `raw` under `code`, if any.
///
/// Absent when the code is unknown, the command has no mapping, or no key
/// equals `raw` exactly.
pub fn map_label(code: &str, raw: &str) -> Option<&'static str> {
    lookup(code).and_then(|spec| spec.label_for(raw))
}
