use std::sync::Arc;

use indexmap::IndexMap;

use crate::descriptor::{Descriptor, Overload, ParamRole, ParamSpec, ParsedInstruction, param};
use crate::semantic::{SemanticToken, modifiers};

const ALIGNMENTS: &[&str] = &[
    "bottom",
    "bottomLeft",
    "bottomRight",
    "center",
    "left",
    "right",
    "top",
    "topLeft",
    "topRight",
];

const RADAR_TARGETS: &[&str] = &[
    "any", "enemy", "ally", "player", "attacker", "flying", "boss", "ground",
];

const RADAR_SORTS: &[&str] = &["distance", "health", "shield", "armor", "maxHealth"];

const CONDITIONS: &[&str] = &[
    "equal",
    "notEqual",
    "lessThan",
    "lessThanEq",
    "greaterThan",
    "greaterThanEq",
    "strictEqual",
    "always",
];

const BINARY_OPS: &[&str] = &[
    "add",
    "sub",
    "mul",
    "div",
    "idiv",
    "mod",
    "emod",
    "pow",
    "equal",
    "notEqual",
    "land",
    "lessThan",
    "lessThanEq",
    "greaterThan",
    "greaterThanEq",
    "strictEqual",
    "shl",
    "shr",
    "ushr",
    "or",
    "and",
    "xor",
    "max",
    "min",
    "angle",
    "angleDiff",
    "len",
    "noise",
    "logn",
];

const UNARY_OPS: &[&str] = &[
    "not", "abs", "sign", "log", "log10", "floor", "ceil", "round", "sqrt", "rand", "sin", "cos",
    "tan", "asin", "acos", "atan",
];

const BUILDING_GROUPS: &[&str] = &[
    "core",
    "storage",
    "generator",
    "turret",
    "factory",
    "repair",
    "battery",
    "reactor",
    "drill",
    "shield",
];

const STATUS_EFFECTS: &[&str] = &[
    "burning",
    "freezing",
    "unmoving",
    "slow",
    "fast",
    "wet",
    "muddy",
    "melting",
    "sapped",
    "tarred",
    "overdrive",
    "overclock",
    "shielded",
    "shocked",
    "blasted",
    "corroded",
    "boss",
    "sporeSlowed",
    "disarmed",
    "electrified",
    "invincible",
];

const MARKER_TYPES: &[&str] = &[
    "shapeText",
    "point",
    "shape",
    "text",
    "line",
    "texture",
    "quad",
];

const PROPERTY_FLAGS: &[&str] = &["true", "false"];

/// Every instruction the processor understands, plus a catch-all for
/// unrecognized names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    Read,
    Write,
    Draw,
    Print,
    PrintChar,
    Format,
    DrawFlush,
    PrintFlush,
    GetLink,
    Control,
    Radar,
    Sensor,
    Set,
    Op,
    Lookup,
    PackColor,
    UnpackColor,
    Select,
    Wait,
    Stop,
    End,
    Jump,
    UBind,
    UControl,
    URadar,
    ULocate,
    GetBlock,
    SetBlock,
    Spawn,
    Status,
    WeatherSense,
    WeatherSet,
    SpawnWave,
    SetRule,
    Message,
    Cutscene,
    Effect,
    Explosion,
    SetRate,
    Fetch,
    Sync,
    GetFlag,
    SetFlag,
    SetProp,
    PlaySound,
    SetMarker,
    MakeMarker,
    LocalePrint,
    Noop,
    Unknown,
}

impl InstructionKind {
    /// Adjusts roles the schema alone cannot express.
    pub fn apply_exceptions(self, parsed: &mut ParsedInstruction) {
        if self == Self::Message
            && let Some(success) = parsed.parameter_mut("success")
            && success.token.content == "@wait"
        {
            success.role = ParamRole::Read;
        }
    }

    pub fn adjust_semantics(self, parsed: &ParsedInstruction, tokens: &mut [SemanticToken]) {
        if !matches!(self, Self::Set | Self::Op) {
            return;
        }
        for parameter in &parsed.parameters {
            if parameter.role != ParamRole::Write || parameter.token.content != "@counter" {
                continue;
            }
            if let Some(token) = tokens
                .iter_mut()
                .find(|token| token.range.span == parameter.token.range.span)
            {
                token.modifiers |= modifiers::CONTROL_FLOW;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisteredInstruction {
    pub name: &'static str,
    pub kind: InstructionKind,
    pub descriptor: Arc<Descriptor>,
}

/// Name to schema table, built once and shared by reference.
#[derive(Debug, Clone)]
pub struct InstructionRegistry {
    instructions: IndexMap<&'static str, RegisteredInstruction>,
}

impl Default for InstructionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InstructionRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            instructions: IndexMap::new(),
        };
        registry.register_io();
        registry.register_flow();
        registry.register_units();
        registry.register_world();
        registry
    }

    fn register(
        &mut self,
        name: &'static str,
        kind: InstructionKind,
        descriptor: impl Into<Descriptor>,
    ) {
        self.instructions.insert(
            name,
            RegisteredInstruction {
                name,
                kind,
                descriptor: Arc::new(descriptor.into()),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredInstruction> {
        self.instructions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.instructions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredInstruction> {
        self.instructions.values()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    fn register_io(&mut self) {
        use InstructionKind as K;

        self.register(
            "read",
            K::Read,
            Descriptor::single([param("result").output(), param("cell"), param("address")]),
        );
        self.register(
            "write",
            K::Write,
            Descriptor::single([param("value"), param("cell"), param("address")]),
        );
        self.register("draw", K::Draw, draw_descriptor());
        self.register("print", K::Print, Descriptor::single([param("value")]));
        self.register("printchar", K::PrintChar, Descriptor::single([param("value")]));
        self.register("format", K::Format, Descriptor::single([param("value")]));
        self.register("drawflush", K::DrawFlush, Descriptor::single([param("target")]));
        self.register("printflush", K::PrintFlush, Descriptor::single([param("target")]));
        self.register(
            "getlink",
            K::GetLink,
            Descriptor::single([param("result").output(), param("index")]),
        );
        self.register(
            "control",
            K::Control,
            Overload::new("action")
                .variant("enabled", [param("building"), param("enabled")])
                .variant(
                    "shoot",
                    [param("building"), param("x"), param("y"), param("shoot")],
                )
                .variant(
                    "shootp",
                    [param("building"), param("unit"), param("shoot")],
                )
                .variant("config", [param("building"), param("value")])
                .variant("color", [param("building"), param("color")]),
        );
        self.register(
            "radar",
            K::Radar,
            Descriptor::single([
                param("target1").one_of(RADAR_TARGETS),
                param("target2").one_of(RADAR_TARGETS),
                param("target3").one_of(RADAR_TARGETS),
                param("sort").one_of(RADAR_SORTS),
                param("building"),
                param("order"),
                param("result").output(),
            ]),
        );
        self.register(
            "sensor",
            K::Sensor,
            Descriptor::single([param("result").output(), param("target"), param("property")]),
        );
    }

    fn register_flow(&mut self) {
        use InstructionKind as K;

        self.register(
            "set",
            K::Set,
            Descriptor::single([param("variable").output(), param("value")]),
        );
        let mut op = Overload::new("operation");
        for &name in BINARY_OPS {
            op = op.variant(name, [param("result").output(), param("a"), param("b")]);
        }
        for &name in UNARY_OPS {
            op = op.variant(name, [param("result").output(), param("value")]);
        }
        self.register("op", K::Op, op);

        let mut lookup = Overload::new("type");
        for name in ["block", "unit", "item", "liquid", "team"] {
            lookup = lookup.variant(name, [param("result").output(), param("id")]);
        }
        self.register("lookup", K::Lookup, lookup);

        self.register(
            "packcolor",
            K::PackColor,
            Descriptor::single([
                param("result").output(),
                param("r"),
                param("g"),
                param("b"),
                param("a"),
            ]),
        );
        self.register(
            "unpackcolor",
            K::UnpackColor,
            Descriptor::single([
                param("r").output(),
                param("g").output(),
                param("b").output(),
                param("a").output(),
                param("value"),
            ]),
        );
        self.register(
            "select",
            K::Select,
            Descriptor::single([
                param("result").output(),
                param("condition").one_of(CONDITIONS),
                param("x"),
                param("y"),
                param("ifTrue"),
                param("ifFalse"),
            ]),
        );
        self.register("wait", K::Wait, Descriptor::single([param("seconds")]));
        self.register("stop", K::Stop, Descriptor::single([]));
        self.register("end", K::End, Descriptor::single([]));
        self.register("noop", K::Noop, Descriptor::single([]));

        let mut jump = Overload::new("condition")
            .prefix([param("destination").label()])
            .variant("always", []);
        for name in CONDITIONS.iter().copied().filter(|name| *name != "always") {
            jump = jump.variant(name, [param("x"), param("y")]);
        }
        self.register("jump", K::Jump, jump);
    }

    fn register_units(&mut self) {
        use InstructionKind as K;

        self.register("ubind", K::UBind, Descriptor::single([param("type")]));
        self.register(
            "ucontrol",
            K::UControl,
            Overload::new("action")
                .variant("idle", [])
                .variant("stop", [])
                .variant("move", [param("x"), param("y")])
                .variant("approach", [param("x"), param("y"), param("radius")])
                .variant("pathfind", [param("x"), param("y")])
                .variant("autoPathfind", [])
                .variant("boost", [param("enable")])
                .variant("target", [param("x"), param("y"), param("shoot")])
                .variant("targetp", [param("unit"), param("shoot")])
                .variant("itemDrop", [param("to"), param("amount")])
                .variant("itemTake", [param("from"), param("item"), param("amount")])
                .variant("payDrop", [])
                .variant("payTake", [param("takeUnits")])
                .variant("payEnter", [])
                .variant("mine", [param("x"), param("y")])
                .variant("flag", [param("value")])
                .variant(
                    "build",
                    [
                        param("x"),
                        param("y"),
                        param("block"),
                        param("rotation"),
                        param("config"),
                    ],
                )
                .variant(
                    "getBlock",
                    [
                        param("x"),
                        param("y"),
                        param("type").output(),
                        param("building").output(),
                        param("floor").output(),
                    ],
                )
                .variant(
                    "within",
                    [
                        param("x"),
                        param("y"),
                        param("radius"),
                        param("result").output(),
                    ],
                )
                .variant("unbind", [])
                .variant("deconstruct", [param("x"), param("y")]),
        );
        self.register(
            "uradar",
            K::URadar,
            Descriptor::single([
                param("target1").one_of(RADAR_TARGETS),
                param("target2").one_of(RADAR_TARGETS),
                param("target3").one_of(RADAR_TARGETS),
                param("sort").one_of(RADAR_SORTS),
                param("_building"),
                param("order"),
                param("result").output(),
            ]),
        );

        let outputs = [
            param("outX").output(),
            param("outY").output(),
            param("found").output(),
        ];
        self.register(
            "ulocate",
            K::ULocate,
            Overload::new("find")
                .variant(
                    "building",
                    [
                        param("group").one_of(BUILDING_GROUPS),
                        param("enemy"),
                        param("_ore"),
                    ]
                    .into_iter()
                    .chain(outputs)
                    .chain([param("building").output()]),
                )
                .variant(
                    "ore",
                    [param("_group"), param("_enemy"), param("ore")]
                        .into_iter()
                        .chain(outputs)
                        .chain([param("_building")]),
                )
                .variant(
                    "spawn",
                    [param("_group"), param("_enemy"), param("_ore")]
                        .into_iter()
                        .chain(outputs)
                        .chain([param("building").output()]),
                )
                .variant(
                    "damaged",
                    [param("_group"), param("_enemy"), param("_ore")]
                        .into_iter()
                        .chain(outputs)
                        .chain([param("building").output()]),
                ),
        );
    }

    fn register_world(&mut self) {
        use InstructionKind as K;

        let mut getblock = Overload::new("layer");
        for layer in ["floor", "ore", "block", "building"] {
            getblock = getblock.variant(layer, [param("result").output(), param("x"), param("y")]);
        }
        self.register("getblock", K::GetBlock, getblock);
        self.register(
            "setblock",
            K::SetBlock,
            Overload::new("layer")
                .variant("floor", [param("to"), param("x"), param("y")])
                .variant("ore", [param("to"), param("x"), param("y")])
                .variant(
                    "block",
                    [
                        param("to"),
                        param("x"),
                        param("y"),
                        param("team"),
                        param("rotation"),
                    ],
                ),
        );
        self.register(
            "spawn",
            K::Spawn,
            Descriptor::single([
                param("type"),
                param("x"),
                param("y"),
                param("rotation"),
                param("team"),
                param("result").output(),
            ]),
        );
        self.register(
            "status",
            K::Status,
            Overload::new("clear")
                .variant(
                    "false",
                    [
                        param("effect").one_of(STATUS_EFFECTS),
                        param("unit"),
                        param("duration"),
                    ],
                )
                .variant("true", [param("effect").one_of(STATUS_EFFECTS), param("unit")]),
        );
        self.register(
            "weathersense",
            K::WeatherSense,
            Descriptor::single([param("result").output(), param("weather")]),
        );
        self.register(
            "weatherset",
            K::WeatherSet,
            Descriptor::single([param("weather"), param("state")]),
        );
        self.register(
            "spawnwave",
            K::SpawnWave,
            Descriptor::single([param("x"), param("y"), param("natural")]),
        );
        self.register("setrule", K::SetRule, setrule_descriptor());
        self.register(
            "message",
            K::Message,
            Overload::new("position")
                .variant("notify", [param("_duration"), param("success").output()])
                .variant("announce", [param("duration"), param("success").output()])
                .variant("toast", [param("duration"), param("success").output()])
                .variant("mission", [param("_duration"), param("success").output()]),
        );
        self.register(
            "cutscene",
            K::Cutscene,
            Overload::new("action")
                .variant("pan", [param("x"), param("y"), param("speed")])
                .variant("zoom", [param("level")])
                .variant("stop", []),
        );
        self.register("effect", K::Effect, effect_descriptor());
        self.register(
            "explosion",
            K::Explosion,
            Descriptor::single([
                param("team"),
                param("x"),
                param("y"),
                param("radius"),
                param("damage"),
                param("air"),
                param("ground"),
                param("pierce"),
                param("effect"),
            ]),
        );
        self.register("setrate", K::SetRate, Descriptor::single([param("ipt")]));
        self.register(
            "fetch",
            K::Fetch,
            Overload::new("type")
                .variant(
                    "unit",
                    [
                        param("result").output(),
                        param("team"),
                        param("index"),
                        param("unitType"),
                    ],
                )
                .variant(
                    "unitCount",
                    [param("result").output(), param("team"), param("unitType")],
                )
                .variant(
                    "player",
                    [param("result").output(), param("team"), param("index")],
                )
                .variant("playerCount", [param("result").output(), param("team")])
                .variant(
                    "core",
                    [param("result").output(), param("team"), param("index")],
                )
                .variant("coreCount", [param("result").output(), param("team")])
                .variant(
                    "build",
                    [
                        param("result").output(),
                        param("team"),
                        param("index"),
                        param("block"),
                    ],
                )
                .variant(
                    "buildCount",
                    [param("result").output(), param("team"), param("block")],
                ),
        );
        self.register("sync", K::Sync, Descriptor::single([param("variable")]));
        self.register(
            "getflag",
            K::GetFlag,
            Descriptor::single([param("result").output(), param("flag")]),
        );
        self.register(
            "setflag",
            K::SetFlag,
            Descriptor::single([param("flag"), param("value")]),
        );
        self.register(
            "setprop",
            K::SetProp,
            Descriptor::single([param("property"), param("target"), param("value")]),
        );
        self.register(
            "playsound",
            K::PlaySound,
            Overload::new("positional")
                .variant(
                    "false",
                    [
                        param("sound"),
                        param("volume"),
                        param("pitch"),
                        param("pan"),
                        param("_x"),
                        param("_y"),
                        param("limit"),
                    ],
                )
                .variant(
                    "true",
                    [
                        param("sound"),
                        param("volume"),
                        param("pitch"),
                        param("_pan"),
                        param("x"),
                        param("y"),
                        param("limit"),
                    ],
                ),
        );
        self.register("setmarker", K::SetMarker, setmarker_descriptor());
        self.register(
            "makemarker",
            K::MakeMarker,
            Descriptor::single([
                param("type").one_of(MARKER_TYPES),
                param("id"),
                param("x"),
                param("y"),
                param("replace"),
            ]),
        );
        self.register("localeprint", K::LocalePrint, Descriptor::single([param("key")]));
    }
}

fn draw_descriptor() -> Overload {
    let shape = |extra: &[ParamSpec]| -> Vec<ParamSpec> {
        [param("x"), param("y")].into_iter().chain(extra.iter().copied()).collect()
    };
    Overload::new("operation")
        .variant("clear", [param("r"), param("g"), param("b")])
        .variant("color", [param("r"), param("g"), param("b"), param("a")])
        .variant("col", [param("color")])
        .variant("stroke", [param("width")])
        .variant("line", shape(&[param("x2"), param("y2")]))
        .variant("rect", shape(&[param("width"), param("height")]))
        .variant("lineRect", shape(&[param("width"), param("height")]))
        .variant(
            "poly",
            shape(&[param("sides"), param("radius"), param("rotation")]),
        )
        .variant(
            "linePoly",
            shape(&[param("sides"), param("radius"), param("rotation")]),
        )
        .variant(
            "triangle",
            shape(&[param("x2"), param("y2"), param("x3"), param("y3")]),
        )
        .variant(
            "image",
            shape(&[param("image"), param("size"), param("rotation")]),
        )
        .variant("print", shape(&[param("align").one_of(ALIGNMENTS)]))
        .variant("translate", shape(&[]))
        .variant("scale", shape(&[]))
        .variant("rotate", [param("degrees")])
        .variant("reset", [])
}

fn setrule_descriptor() -> Overload {
    const SINGLE_VALUE: &[&str] = &[
        "currentWaveTime",
        "waveTimer",
        "waves",
        "wave",
        "waveSpacing",
        "waveSending",
        "attackMode",
        "enemyCoreBuildRadius",
        "dropZoneRadius",
        "unitCap",
        "lighting",
        "canGameOver",
        "ambientLight",
        "solarMultiplier",
        "ban",
        "unban",
    ];
    const PER_TEAM: &[&str] = &[
        "unitHealth",
        "unitBuildSpeed",
        "unitMineSpeed",
        "unitCost",
        "unitDamage",
        "blockHealth",
        "blockDamage",
        "buildSpeed",
        "rtsMinWeight",
        "rtsMinSquad",
    ];

    let mut overload = Overload::new("rule");
    for &rule in SINGLE_VALUE {
        overload = overload.variant(rule, [param("value")]);
    }
    overload = overload.variant(
        "mapArea",
        [param("x"), param("y"), param("width"), param("height")],
    );
    for &rule in PER_TEAM {
        overload = overload.variant(rule, [param("team"), param("value")]);
    }
    overload
}

fn effect_descriptor() -> Overload {
    const POSITION_ONLY: &[&str] = &["warn", "cross", "spawn", "bubble"];
    const SIZED: &[&str] = &["placeBlock", "placeBlockSpark", "breakBlock", "explosion"];
    const COLORED: &[&str] = &[
        "smokeCloud",
        "vapor",
        "hit",
        "hitSquare",
        "smokeSmall",
        "smokeBig",
        "spark",
        "sparkBig",
        "drill",
        "drillBig",
        "smokePuff",
        "sparkExplosion",
    ];
    const ROTATED: &[&str] = &[
        "shootSmall",
        "shootBig",
        "smokeColor",
        "smokeSquare",
        "smokeSquareBig",
        "sparkShoot",
        "sparkShootBig",
    ];
    const SIZED_COLORED: &[&str] = &["trail", "breakProp", "lightBlock", "crossExplosion", "wave"];

    let mut overload = Overload::new("effect");
    for &name in POSITION_ONLY {
        overload = overload.variant(name, [param("x"), param("y")]);
    }
    for &name in SIZED {
        overload = overload.variant(name, [param("x"), param("y"), param("size")]);
    }
    for &name in COLORED {
        overload = overload.variant(name, [param("x"), param("y"), param("color")]);
    }
    for &name in ROTATED {
        overload = overload.variant(
            name,
            [param("x"), param("y"), param("rotation"), param("color")],
        );
    }
    for &name in SIZED_COLORED {
        overload = overload.variant(name, [param("x"), param("y"), param("size"), param("color")]);
    }
    overload.variant(
        "blockFall",
        [
            param("x"),
            param("y"),
            param("_rotation"),
            param("_color"),
            param("data"),
        ],
    )
}

fn setmarker_descriptor() -> Overload {
    const SINGLE_VALUE: &[&str] = &[
        "world",
        "minimap",
        "autoscale",
        "drawLayer",
        "color",
        "radius",
        "stroke",
        "rotation",
        "fontSize",
        "textHeight",
        "flushText",
    ];
    let mut overload = Overload::new("property").variant("remove", [param("id")]);
    for &name in SINGLE_VALUE {
        overload = overload.variant(name, [param("id"), param("value")]);
    }
    overload
        .variant("pos", [param("id"), param("x"), param("y")])
        .variant("endPos", [param("id"), param("x"), param("y")])
        .variant(
            "shape",
            [param("id"), param("sides"), param("fill"), param("outline")],
        )
        .variant("arc", [param("id"), param("start"), param("end")])
        .variant(
            "labelFlags",
            [
                param("id"),
                param("background").one_of(PROPERTY_FLAGS),
                param("outline").one_of(PROPERTY_FLAGS),
            ],
        )
        .variant(
            "texture",
            [param("id"), param("printFlush"), param("name")],
        )
        .variant("textureSize", [param("id"), param("width"), param("height")])
        .variant(
            "posi",
            [param("id"), param("index"), param("x"), param("y")],
        )
        .variant(
            "uvi",
            [param("id"), param("index"), param("x"), param("y")],
        )
        .variant("colori", [param("id"), param("index"), param("color")])
}
