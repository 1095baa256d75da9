use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::sema::{Symbol, SymbolFlags};
use crate::token::Rgba;

/// Block name suffixes the processor uses when it names linked buildings
/// (`cell1`, `display2`, ...).
pub const BUILDING_ALIASES: &[&str] = &[
    "switch",
    "message",
    "cell",
    "bank",
    "display",
    "canvas",
    "processor",
    "sorter",
    "inverter",
    "gate",
    "router",
    "junction",
    "bridge",
    "conveyor",
    "duct",
    "unloader",
    "container",
    "vault",
    "core",
    "node",
    "diode",
    "battery",
    "panel",
    "generator",
    "reactor",
    "door",
    "drill",
    "pump",
    "conduit",
    "tank",
    "smelter",
    "press",
    "factory",
    "reconstructor",
    "illuminator",
    "duo",
    "scatter",
    "scorch",
    "hail",
    "wave",
    "lancer",
    "arc",
    "parallax",
    "swarmer",
    "salvo",
    "segment",
    "tsunami",
    "fuse",
    "ripple",
    "cyclone",
    "foreshadow",
    "spectre",
    "meltdown",
    "breach",
    "diffuse",
    "sublimate",
    "titan",
    "disperse",
    "afflict",
    "lustre",
    "scathe",
    "smite",
    "malign",
    "projector",
    "mender",
    "radar",
];

const KEYWORDS: &[&str] = &["true", "false", "null"];

const CONSTANTS: &[&str] = &[
    "@this",
    "@thisx",
    "@thisy",
    "@ipt",
    "@links",
    "@time",
    "@tick",
    "@second",
    "@minute",
    "@waveNumber",
    "@waveTime",
    "@mapw",
    "@maph",
    "@server",
    "@client",
    "@clientLocale",
    "@clientUnit",
    "@clientName",
    "@clientTeam",
    "@clientMobile",
    "@unit",
    "@pi",
    "@e",
    "@degToRad",
    "@radToDeg",
    "@wait",
    "@ctrlProcessor",
    "@ctrlPlayer",
    "@ctrlCommand",
    "@air",
    "@solid",
    "@blockCount",
    "@unitCount",
    "@itemCount",
    "@liquidCount",
];

const SENSORS: &[&str] = &[
    "@totalItems",
    "@firstItem",
    "@totalLiquids",
    "@totalPower",
    "@itemCapacity",
    "@liquidCapacity",
    "@powerCapacity",
    "@powerNetStored",
    "@powerNetCapacity",
    "@powerNetIn",
    "@powerNetOut",
    "@ammo",
    "@totalAmmo",
    "@ammoCapacity",
    "@currentAmmoType",
    "@x",
    "@y",
    "@color",
    "@size",
    "@dead",
    "@range",
    "@shooting",
    "@boosting",
    "@mineX",
    "@mineY",
    "@mining",
    "@speed",
    "@team",
    "@type",
    "@flag",
    "@controlled",
    "@controller",
    "@name",
    "@payloadCount",
    "@payloadType",
    "@id",
    "@enabled",
    "@config",
    "@shootX",
    "@shootY",
    "@rotation",
    "@health",
    "@maxHealth",
    "@heat",
    "@shield",
    "@armor",
    "@powerUsage",
    "@efficiency",
    "@progress",
    "@timescale",
    "@displayWidth",
    "@displayHeight",
    "@bufferSize",
    "@operations",
    "@memoryCapacity",
    "@cameraX",
    "@cameraY",
    "@cameraWidth",
    "@cameraHeight",
];

const ITEMS: &[(&str, u32)] = &[
    ("@copper", 0xd99d73),
    ("@lead", 0x8c7fa9),
    ("@metaglass", 0xebeef5),
    ("@graphite", 0xb2c6d2),
    ("@sand", 0xf7cba4),
    ("@coal", 0x272727),
    ("@titanium", 0x8da1e3),
    ("@thorium", 0xf9a3c7),
    ("@scrap", 0x777777),
    ("@silicon", 0x53565c),
    ("@plastanium", 0xcbd97f),
    ("@phase-fabric", 0xf4ba6e),
    ("@surge-alloy", 0xf3e979),
    ("@spore-pod", 0x7457ce),
    ("@blast-compound", 0xff795e),
    ("@pyratite", 0xffaa5f),
    ("@beryllium", 0x3a8f64),
    ("@tungsten", 0x768a9a),
    ("@oxide", 0xe4ffd6),
    ("@carbide", 0x89769a),
];

const LIQUIDS: &[(&str, u32)] = &[
    ("@water", 0x596ab8),
    ("@slag", 0xffa166),
    ("@oil", 0x313131),
    ("@cryofluid", 0x6ecdec),
    ("@neoplasm", 0xc33e2b),
    ("@arkycite", 0x84a94b),
    ("@gallium", 0x9a9dbf),
    ("@ozone", 0xfc81dd),
    ("@hydrogen", 0x9eabf7),
    ("@nitrogen", 0xefe3ff),
    ("@cyanogen", 0x89e8b6),
];

const TEAMS: &[(&str, u32)] = &[
    ("@derelict", 0x4d4e58),
    ("@sharded", 0xffd37f),
    ("@crux", 0xf25555),
    ("@malis", 0xa27ce5),
    ("@green", 0x54d67d),
    ("@blue", 0x6c87fd),
];

const UNITS: &[&str] = &[
    "@dagger",
    "@mace",
    "@fortress",
    "@scepter",
    "@reign",
    "@nova",
    "@pulsar",
    "@quasar",
    "@vela",
    "@corvus",
    "@crawler",
    "@atrax",
    "@spiroct",
    "@arkyid",
    "@toxopid",
    "@flare",
    "@horizon",
    "@zenith",
    "@antumbra",
    "@eclipse",
    "@mono",
    "@poly",
    "@mega",
    "@quad",
    "@oct",
    "@risso",
    "@minke",
    "@bryde",
    "@sei",
    "@omura",
    "@retusa",
    "@oxynoe",
    "@cyerce",
    "@aegires",
    "@navanax",
    "@alpha",
    "@beta",
    "@gamma",
    "@stell",
    "@locus",
    "@precept",
    "@vanquish",
    "@conquer",
    "@merui",
    "@cleroi",
    "@anthicus",
    "@tecta",
    "@collaris",
    "@elude",
    "@avert",
    "@obviate",
    "@quell",
    "@disrupt",
    "@evoke",
    "@incite",
    "@emanate",
];

const BLOCKS: &[&str] = &[
    "@message",
    "@switch",
    "@micro-processor",
    "@logic-processor",
    "@hyper-processor",
    "@world-processor",
    "@memory-cell",
    "@memory-bank",
    "@world-cell",
    "@logic-display",
    "@large-logic-display",
    "@canvas",
    "@core-shard",
    "@core-foundation",
    "@core-nucleus",
    "@core-bastion",
    "@core-citadel",
    "@core-acropolis",
    "@conveyor",
    "@titanium-conveyor",
    "@router",
    "@sorter",
    "@unloader",
    "@container",
    "@vault",
    "@mender",
    "@duo",
    "@scatter",
    "@lancer",
    "@ripple",
    "@cyclone",
    "@foreshadow",
    "@spectre",
    "@meltdown",
    "@power-node",
    "@battery",
    "@solar-panel",
    "@thorium-reactor",
    "@stone",
    "@sand-floor",
    "@darksand",
    "@grass",
    "@water-floor",
];

const WEATHERS: &[&str] = &["@rain", "@snow", "@sandstorm", "@sporestorm", "@fog"];

/// Process-wide table of names the processor defines. Never mutated after
/// construction; per-document symbols live in [`crate::sema::SymbolTable`].
#[derive(Debug, Clone)]
pub struct Builtins {
    symbols: IndexMap<&'static str, Symbol>,
}

static BUILTINS: LazyLock<Builtins> = LazyLock::new(Builtins::standard);

pub fn builtins() -> &'static Builtins {
    &BUILTINS
}

impl Builtins {
    fn standard() -> Self {
        let mut symbols = IndexMap::new();
        let readonly = SymbolFlags {
            global: true,
            ..SymbolFlags::default()
        };

        for name in KEYWORDS {
            let flags = SymbolFlags {
                keyword: true,
                ..readonly
            };
            symbols.insert(*name, Symbol::new(*name, flags));
        }
        symbols.insert(
            "@counter",
            Symbol::new(
                "@counter",
                SymbolFlags {
                    writeable: true,
                    ..readonly
                },
            ),
        );
        for name in CONSTANTS
            .iter()
            .chain(SENSORS)
            .chain(UNITS)
            .chain(BLOCKS)
            .chain(WEATHERS)
        {
            symbols
                .entry(*name)
                .or_insert_with(|| Symbol::new(*name, readonly));
        }
        for (name, rgb) in ITEMS.iter().chain(LIQUIDS).chain(TEAMS) {
            symbols.insert(
                *name,
                Symbol::new(*name, readonly).with_color(Rgba::opaque(*rgb)),
            );
        }

        Self { symbols }
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.symbols.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Highest link number whose lower siblings are back-filled into the symbol
/// table. Larger suffixes still count as links but only name themselves.
pub const LINK_BACKFILL_LIMIT: u32 = 256;

/// Splits `cell12` into (`cell`, 12) when the prefix is a known building alias.
pub fn split_building_link(name: &str) -> Option<(&str, u32)> {
    let digits_start = name.find(|ch: char| ch.is_ascii_digit())?;
    let (alias, digits) = name.split_at(digits_start);
    if !BUILDING_ALIASES.contains(&alias) || digits.starts_with('0') {
        return None;
    }
    if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let number = digits.parse().ok()?;
    Some((alias, number))
}

pub fn is_building_link(name: &str) -> bool {
    split_building_link(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_the_only_writeable_builtin() {
        let writeable: Vec<_> = builtins()
            .iter()
            .filter(|symbol| symbol.flags.writeable)
            .map(|symbol| symbol.name.as_str())
            .collect();
        assert_eq!(writeable, ["@counter"]);
    }

    #[test]
    fn keywords_are_flagged() {
        let symbol = builtins().get("null").expect("null");
        assert!(symbol.flags.keyword);
        assert!(!builtins().get("@unit").expect("@unit").flags.keyword);
    }

    #[test]
    fn items_carry_colors() {
        let copper = builtins().get("@copper").expect("@copper");
        assert_eq!(copper.color, Some(Rgba::opaque(0xd99d73)));
    }

    #[test]
    fn recognizes_building_links() {
        assert_eq!(split_building_link("cell12"), Some(("cell", 12)));
        assert!(is_building_link("display1"));
        assert!(!is_building_link("cell"));
        assert!(!is_building_link("cell0"));
        assert!(!is_building_link("cell1a"));
        assert!(!is_building_link("foo1"));
    }
}
