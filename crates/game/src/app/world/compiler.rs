use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use thiserror::Error;
use town_engine::{Color, Rect, Vec2};

use super::scenery::generate_scenery;
use super::{
    Building, Crosswalk, FloorStyle, Furniture, FurnitureKind, GameMap, MapKind, Npc,
    NpcAppearance, Portal, Road, WaterBody, WorldRegistry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SourceLocation {
    pub(crate) line: usize,
    pub(crate) column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorldErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownAttribute,
    DuplicateElement,
    MissingAttribute,
    MissingField,
    InvalidValue,
    DuplicateId,
    Validation,
}

#[derive(Debug, Clone)]
pub(crate) struct WorldCompileError {
    pub(crate) code: WorldErrorCode,
    pub(crate) message: String,
    pub(crate) file_path: PathBuf,
    pub(crate) location: Option<SourceLocation>,
}

impl fmt::Display for WorldCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for WorldCompileError {}

/// Cross-reference failures found after every element parsed cleanly.
#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum WorldValidationError {
    #[error("expected exactly one outdoor map, found {count}")]
    OutdoorMapCount { count: usize },
    #[error("start map '{map}' does not exist")]
    UnknownStartMap { map: String },
    #[error("start position ({x}, {y}) lies outside map '{map}'")]
    StartOutOfBounds { map: String, x: f32, y: f32 },
    #[error("portal in map '{map}' targets unknown map '{target}'")]
    UnknownPortalTarget { map: String, target: String },
    #[error("portal in map '{map}' spawns at ({x}, {y}) outside map '{target}'")]
    PortalTargetOutOfBounds {
        map: String,
        target: String,
        x: f32,
        y: f32,
    },
    #[error(
        "portal in map '{map}' spawns at ({x}, {y}) inside a portal of map '{target}'; \
the player would bounce between maps"
    )]
    PortalTargetInsidePortal {
        map: String,
        target: String,
        x: f32,
        y: f32,
    },
    #[error("indoor map '{map}' must list its exit to the outdoor map as its first portal")]
    MissingExit { map: String },
    #[error("npc '{npc}' is bound to unknown map '{map}'")]
    UnknownNpcMap { npc: String, map: String },
    #[error("npc '{npc}' stands outside map '{map}'")]
    NpcOutOfBounds { npc: String, map: String },
}

pub(crate) fn load_world(file_path: &Path) -> Result<WorldRegistry, WorldCompileError> {
    let raw = fs::read_to_string(file_path).map_err(|source| WorldCompileError {
        code: WorldErrorCode::ReadFile,
        message: format!("failed to read world file: {source}"),
        file_path: file_path.to_path_buf(),
        location: None,
    })?;
    compile_world(file_path, &raw)
}

pub(crate) fn compile_world(
    file_path: &Path,
    raw: &str,
) -> Result<WorldRegistry, WorldCompileError> {
    let doc = Document::parse(raw).map_err(|error| WorldCompileError {
        code: WorldErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let cx = DocContext {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "World" {
        return Err(cx.error_at(
            WorldErrorCode::InvalidRoot,
            "root element must be <World>".to_string(),
            root,
        ));
    }
    cx.check_attributes(root, &["startMap", "startX", "startY"])?;
    let start_map = cx.required_attr(root, "startMap")?;
    let start_position = Vec2::new(cx.attr_f32(root, "startX")?, cx.attr_f32(root, "startY")?);

    let mut maps = Vec::<GameMap>::new();
    let mut npcs = Vec::<Npc>::new();
    let mut map_ids = HashSet::<String>::new();
    let mut npc_ids = HashSet::<String>::new();

    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "Map" => {
                let map = parse_map(&cx, child)?;
                if !map_ids.insert(map.id.clone()) {
                    return Err(cx.error_at(
                        WorldErrorCode::DuplicateId,
                        format!("duplicate map id '{}'", map.id),
                        child,
                    ));
                }
                maps.push(map);
            }
            "Npc" => {
                let npc = parse_npc(&cx, child)?;
                if !npc_ids.insert(npc.id.clone()) {
                    return Err(cx.error_at(
                        WorldErrorCode::DuplicateId,
                        format!("duplicate npc id '{}'", npc.id),
                        child,
                    ));
                }
                npcs.push(npc);
            }
            other => {
                return Err(cx.error_at(
                    WorldErrorCode::UnknownElement,
                    format!("unsupported element <{other}> in <World>; expected <Map> or <Npc>"),
                    child,
                ))
            }
        }
    }

    let outdoor_index = validate_world(&maps, &npcs, &start_map, start_position).map_err(
        |error| WorldCompileError {
            code: WorldErrorCode::Validation,
            message: error.to_string(),
            file_path: file_path.to_path_buf(),
            location: None,
        },
    )?;

    Ok(WorldRegistry {
        maps,
        npcs,
        outdoor_index,
        start_map,
        start_position,
    })
}

/// Returns the index of the single outdoor map.
pub(crate) fn validate_world(
    maps: &[GameMap],
    npcs: &[Npc],
    start_map: &str,
    start_position: Vec2,
) -> Result<usize, WorldValidationError> {
    let outdoor = maps
        .iter()
        .enumerate()
        .filter(|(_, map)| map.is_outdoor())
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    let &[outdoor_index] = outdoor.as_slice() else {
        return Err(WorldValidationError::OutdoorMapCount {
            count: outdoor.len(),
        });
    };
    let outdoor_id = maps[outdoor_index].id.as_str();

    let find = |id: &str| maps.iter().find(|map| map.id == id);

    let start = find(start_map).ok_or_else(|| WorldValidationError::UnknownStartMap {
        map: start_map.to_string(),
    })?;
    if !start.contains(start_position) {
        return Err(WorldValidationError::StartOutOfBounds {
            map: start_map.to_string(),
            x: start_position.x,
            y: start_position.y,
        });
    }

    for map in maps {
        for portal in &map.portals {
            let target =
                find(&portal.target_map).ok_or_else(|| WorldValidationError::UnknownPortalTarget {
                    map: map.id.clone(),
                    target: portal.target_map.clone(),
                })?;
            let spawn = portal.target_position;
            if !target.contains(spawn) {
                return Err(WorldValidationError::PortalTargetOutOfBounds {
                    map: map.id.clone(),
                    target: target.id.clone(),
                    x: spawn.x,
                    y: spawn.y,
                });
            }
            if target.portal_at(spawn).is_some() {
                return Err(WorldValidationError::PortalTargetInsidePortal {
                    map: map.id.clone(),
                    target: target.id.clone(),
                    x: spawn.x,
                    y: spawn.y,
                });
            }
        }

        if !map.is_outdoor()
            && map
                .portals
                .first()
                .map_or(true, |exit| exit.target_map != outdoor_id)
        {
            return Err(WorldValidationError::MissingExit {
                map: map.id.clone(),
            });
        }
    }

    for npc in npcs {
        let map = find(&npc.map_id).ok_or_else(|| WorldValidationError::UnknownNpcMap {
            npc: npc.id.clone(),
            map: npc.map_id.clone(),
        })?;
        if !map.contains(npc.position) {
            return Err(WorldValidationError::NpcOutOfBounds {
                npc: npc.id.clone(),
                map: npc.map_id.clone(),
            });
        }
    }

    Ok(outdoor_index)
}

fn parse_map(cx: &DocContext<'_, '_>, node: Node<'_, '_>) -> Result<GameMap, WorldCompileError> {
    cx.check_attributes(
        node,
        &[
            "id",
            "name",
            "kind",
            "width",
            "height",
            "floorType",
            "floorColor",
        ],
    )?;
    let id = cx.required_attr(node, "id")?;
    let name = cx.required_attr(node, "name")?;
    let kind = match cx.required_attr(node, "kind")?.as_str() {
        "outdoor" => MapKind::Outdoor,
        "indoor" => MapKind::Indoor,
        other => {
            return Err(cx.error_at(
                WorldErrorCode::InvalidValue,
                format!("invalid map kind '{other}'; allowed values: outdoor, indoor"),
                node,
            ))
        }
    };
    let width = cx.attr_positive(node, "width")?;
    let height = cx.attr_positive(node, "height")?;
    let floor_raw = cx.required_attr(node, "floorType")?;
    let floor = FloorStyle::parse(&floor_raw).ok_or_else(|| {
        cx.error_at(
            WorldErrorCode::InvalidValue,
            format!("invalid floorType '{floor_raw}'; allowed values: grass, tile, wood, carpet"),
            node,
        )
    })?;
    let floor_color = cx.attr_color(node, "floorColor")?;

    let mut map = GameMap {
        id,
        name,
        kind,
        width,
        height,
        floor,
        floor_color,
        portals: Vec::new(),
        furniture: Vec::new(),
        buildings: Vec::new(),
        roads: Vec::new(),
        crosswalks: Vec::new(),
        water: None,
        trees: Vec::new(),
        flowers: Vec::new(),
    };
    let mut seen_scenery = false;

    for child in node.children().filter(|child| child.is_element()) {
        let tag = child.tag_name().name();
        let outdoor_only = matches!(tag, "Building" | "Road" | "Crosswalk" | "Water" | "Scenery");
        if outdoor_only && kind != MapKind::Outdoor {
            return Err(cx.error_at(
                WorldErrorCode::UnknownElement,
                format!("<{tag}> is only allowed on outdoor maps (map '{}')", map.id),
                child,
            ));
        }

        match tag {
            "Portal" => {
                cx.check_attributes(child, &["x", "y", "w", "h", "target", "targetX", "targetY"])?;
                map.portals.push(Portal {
                    rect: cx.attr_rect(child)?,
                    target_map: cx.required_attr(child, "target")?,
                    target_position: Vec2::new(
                        cx.attr_f32(child, "targetX")?,
                        cx.attr_f32(child, "targetY")?,
                    ),
                });
            }
            "Furniture" => {
                cx.check_attributes(child, &["type", "x", "y", "w", "h", "color"])?;
                let raw_kind = cx.required_attr(child, "type")?;
                let kind = FurnitureKind::parse(&raw_kind).ok_or_else(|| {
                    cx.error_at(
                        WorldErrorCode::InvalidValue,
                        format!(
                            "unknown furniture type '{raw_kind}'; allowed values: {}",
                            FurnitureKind::ALL_TOKENS
                        ),
                        child,
                    )
                })?;
                map.furniture.push(Furniture {
                    kind,
                    rect: cx.attr_rect(child)?,
                    color: cx.attr_color(child, "color")?,
                });
            }
            "Building" => {
                cx.check_attributes(child, &["label", "x", "y", "w", "h", "color"])?;
                map.buildings.push(Building {
                    label: cx.required_attr(child, "label")?,
                    rect: cx.attr_rect(child)?,
                    color: cx.attr_color(child, "color")?,
                });
            }
            "Road" => {
                cx.check_attributes(child, &["x", "y", "w", "h"])?;
                map.roads.push(Road {
                    rect: cx.attr_rect(child)?,
                });
            }
            "Crosswalk" => {
                cx.check_attributes(child, &["x", "y", "w", "h", "vertical"])?;
                map.crosswalks.push(Crosswalk {
                    rect: cx.attr_rect(child)?,
                    vertical: cx.attr_bool(child, "vertical")?,
                });
            }
            "Water" => {
                if map.water.is_some() {
                    return Err(cx.error_at(
                        WorldErrorCode::DuplicateElement,
                        format!("map '{}' may declare only one <Water>", map.id),
                        child,
                    ));
                }
                cx.check_attributes(child, &["cx", "cy", "rx", "ry", "color"])?;
                map.water = Some(WaterBody {
                    center: Vec2::new(cx.attr_f32(child, "cx")?, cx.attr_f32(child, "cy")?),
                    radius_x: cx.attr_positive(child, "rx")?,
                    radius_y: cx.attr_positive(child, "ry")?,
                    color: cx.attr_color(child, "color")?,
                });
            }
            "Scenery" => {
                if seen_scenery {
                    return Err(cx.error_at(
                        WorldErrorCode::DuplicateElement,
                        format!("map '{}' may declare only one <Scenery>", map.id),
                        child,
                    ));
                }
                seen_scenery = true;
                cx.check_attributes(child, &["seed", "trees", "flowers"])?;
                let seed = cx.attr_parsed::<u64>(child, "seed")?;
                let tree_count = cx.attr_parsed::<usize>(child, "trees")?;
                let flower_count = cx.attr_parsed::<usize>(child, "flowers")?;
                let (trees, flowers) =
                    generate_scenery(seed, tree_count, flower_count, width, height);
                map.trees = trees;
                map.flowers = flowers;
            }
            other => {
                return Err(cx.error_at(
                    WorldErrorCode::UnknownElement,
                    format!("unsupported element <{other}> in <Map>"),
                    child,
                ))
            }
        }
    }

    Ok(map)
}

fn parse_npc(cx: &DocContext<'_, '_>, node: Node<'_, '_>) -> Result<Npc, WorldCompileError> {
    cx.check_attributes(
        node,
        &["id", "map", "name", "x", "y", "skin", "hair", "shirt", "pants"],
    )?;
    let id = cx.required_attr(node, "id")?;
    let mut profile: Option<String> = None;
    let mut greeting: Option<String> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name();
        let slot = match field_name {
            "Profile" => &mut profile,
            "Greeting" => &mut greeting,
            _ => {
                return Err(cx.error_at(
                    WorldErrorCode::UnknownElement,
                    format!("unknown field <{field_name}> in <Npc>"),
                    field,
                ))
            }
        };
        if slot.is_some() {
            return Err(cx.error_at(
                WorldErrorCode::DuplicateElement,
                format!("duplicate field <{field_name}> in <Npc id=\"{id}\">"),
                field,
            ));
        }
        *slot = Some(cx.required_text(field, field_name)?);
    }

    let Some(profile) = profile else {
        return Err(cx.error_at(
            WorldErrorCode::MissingField,
            format!("missing required field <Profile> in <Npc id=\"{id}\">"),
            node,
        ));
    };
    let Some(greeting) = greeting else {
        return Err(cx.error_at(
            WorldErrorCode::MissingField,
            format!("missing required field <Greeting> in <Npc id=\"{id}\">"),
            node,
        ));
    };

    Ok(Npc {
        map_id: cx.required_attr(node, "map")?,
        name: cx.required_attr(node, "name")?,
        position: Vec2::new(cx.attr_f32(node, "x")?, cx.attr_f32(node, "y")?),
        appearance: NpcAppearance {
            skin: cx.attr_color(node, "skin")?,
            hair: cx.attr_color(node, "hair")?,
            shirt: cx.attr_color(node, "shirt")?,
            pants: cx.attr_color(node, "pants")?,
        },
        id,
        profile,
        greeting,
    })
}

struct DocContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DocContext<'_, '_> {
    fn error_at(&self, code: WorldErrorCode, message: String, node: Node<'_, '_>) -> WorldCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        WorldCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn check_attributes(&self, node: Node<'_, '_>, allowed: &[&str]) -> Result<(), WorldCompileError> {
        for attribute in node.attributes() {
            if !allowed.contains(&attribute.name()) {
                return Err(self.error_at(
                    WorldErrorCode::UnknownAttribute,
                    format!(
                        "unknown attribute '{}' on <{}>; allowed: {}",
                        attribute.name(),
                        node.tag_name().name(),
                        allowed.join(", ")
                    ),
                    node,
                ));
            }
        }
        Ok(())
    }

    fn required_attr(&self, node: Node<'_, '_>, name: &str) -> Result<String, WorldCompileError> {
        let value = node.attribute(name).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(self.error_at(
                WorldErrorCode::MissingAttribute,
                format!(
                    "missing required attribute '{}' on <{}>",
                    name,
                    node.tag_name().name()
                ),
                node,
            ));
        }
        Ok(value.to_string())
    }

    fn required_text(&self, node: Node<'_, '_>, field_name: &str) -> Result<String, WorldCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                WorldErrorCode::MissingField,
                format!("field <{field_name}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }

    fn attr_parsed<T: std::str::FromStr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<T, WorldCompileError> {
        let value = self.required_attr(node, name)?;
        value.parse::<T>().map_err(|_| {
            self.error_at(
                WorldErrorCode::InvalidValue,
                format!(
                    "attribute '{}' on <{}> has invalid value '{}'",
                    name,
                    node.tag_name().name(),
                    value
                ),
                node,
            )
        })
    }

    fn attr_f32(&self, node: Node<'_, '_>, name: &str) -> Result<f32, WorldCompileError> {
        let parsed = self.attr_parsed::<f32>(node, name)?;
        if !parsed.is_finite() {
            return Err(self.error_at(
                WorldErrorCode::InvalidValue,
                format!("attribute '{name}' must be finite"),
                node,
            ));
        }
        Ok(parsed)
    }

    fn attr_positive(&self, node: Node<'_, '_>, name: &str) -> Result<f32, WorldCompileError> {
        let parsed = self.attr_f32(node, name)?;
        if parsed <= 0.0 {
            return Err(self.error_at(
                WorldErrorCode::InvalidValue,
                format!("attribute '{name}' must be > 0"),
                node,
            ));
        }
        Ok(parsed)
    }

    fn attr_rect(&self, node: Node<'_, '_>) -> Result<Rect, WorldCompileError> {
        Ok(Rect::new(
            self.attr_f32(node, "x")?,
            self.attr_f32(node, "y")?,
            self.attr_positive(node, "w")?,
            self.attr_positive(node, "h")?,
        ))
    }

    fn attr_color(&self, node: Node<'_, '_>, name: &str) -> Result<Color, WorldCompileError> {
        let value = self.required_attr(node, name)?;
        Color::from_hex(&value).ok_or_else(|| {
            self.error_at(
                WorldErrorCode::InvalidValue,
                format!("attribute '{name}' must be a #rrggbb color, got '{value}'"),
                node,
            )
        })
    }

    fn attr_bool(&self, node: Node<'_, '_>, name: &str) -> Result<bool, WorldCompileError> {
        match self.required_attr(node, name)?.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(self.error_at(
                WorldErrorCode::InvalidValue,
                format!("attribute '{name}' must be true or false, got '{other}'"),
                node,
            )),
        }
    }
}
