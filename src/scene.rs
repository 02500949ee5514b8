use anyhow::{anyhow, Context, Result};
use glam::{EulerRot, Quat, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::config::{DemoKind, DemoSettings};

const STATIC_SCENE: &str = include_str!("../scenes/static.xml");
const PHYSICS_SCENE: &str = include_str!("../scenes/physics.xml");

/// Runtime representation of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Scene {
    pub settings: DemoSettings,
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
}

impl Scene {
    /// Returns the scene shipped with the crate for the given demo.
    pub fn builtin(kind: DemoKind) -> Result<Self> {
        let xml = match kind {
            DemoKind::Static => STATIC_SCENE,
            DemoKind::Physics => PHYSICS_SCENE,
        };
        Self::from_xml(xml).with_context(|| format!("built-in {kind} scene is invalid"))
    }

    /// Parses a scene document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;

        let settings = match document
            .descendants()
            .find(|node| node.has_tag_name("settings"))
        {
            Some(node) => parse_settings(&node).context("invalid <settings>")?,
            None => DemoSettings::default(),
        };
        settings.validate()?;

        let mut objects = Vec::new();
        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            let object = parse_object(&node)?;
            objects.push(object);
        }

        let lights = objects
            .iter()
            .filter(|obj| obj.object_type == "light")
            .map(|obj| Light {
                position: obj.position,
                color: obj.color,
                intensity: obj.intensity,
            })
            .collect();

        Ok(Self {
            settings,
            objects,
            lights,
        })
    }

    pub fn find_by_type(&self, object_type: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.object_type == object_type)
    }

    /// Height of the floor's top face, if the scene has a floor.
    pub fn floor_top(&self) -> Option<f32> {
        self.find_by_type("floor")
            .map(|floor| floor.position.y + floor.size.y * 0.5)
    }
}

/// Scene object as described by the scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default = "default_color")]
    pub color: Vec3,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    /// Full box extents.
    #[serde(default = "default_size")]
    pub size: Vec3,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default)]
    pub target: Vec3,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            object_type: String::new(),
            color: default_color(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            size: default_size(),
            fov: default_fov(),
            intensity: default_intensity(),
            target: Vec3::ZERO,
        }
    }
}

impl SceneObject {
    /// Creates a box-shaped object.
    pub fn cuboid(name: &str, object_type: &str, position: Vec3, size: Vec3, color: Vec3) -> Self {
        Self {
            name: name.to_string(),
            object_type: object_type.to_string(),
            position,
            size,
            color,
            ..Self::default()
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Whether the renderer draws this object as a box.
    pub fn is_solid(&self) -> bool {
        matches!(
            self.object_type.as_str(),
            "mesh" | "cube" | "player" | "floor" | "obstacle" | "wall"
        )
    }
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_size() -> Vec3 {
    Vec3::ONE
}

fn default_fov() -> f32 {
    45.0
}

fn default_intensity() -> f32 {
    1.0
}

/// Light extracted from the scene object list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

fn parse_object(node: &Node<'_, '_>) -> Result<SceneObject> {
    let mut object = SceneObject {
        name: required_text(node, "name")?,
        object_type: optional_text(node, "type").unwrap_or_else(|| "mesh".to_string()),
        ..SceneObject::default()
    };
    let context = || format!("invalid object `{}`", object.name);
    object.color = parse_color(optional_text(node, "color"), object.color).with_context(context)?;
    object.position =
        parse_vec3(optional_text(node, "position"), object.position).with_context(context)?;
    let euler = parse_vec3(optional_text(node, "rotation"), Vec3::ZERO).with_context(context)?;
    object.rotation = rotation_from_degrees(euler);
    object.size = parse_vec3(optional_text(node, "size"), object.size).with_context(context)?;
    object.fov = parse_f32(optional_text(node, "fov"), object.fov).with_context(context)?;
    object.intensity =
        parse_f32(optional_text(node, "intensity"), object.intensity).with_context(context)?;
    object.target =
        parse_vec3(optional_text(node, "target"), object.target).with_context(context)?;
    if object.size.min_element() < 0.0 {
        return Err(anyhow!("object `{}` has a negative size", object.name));
    }
    Ok(object)
}

fn parse_settings(node: &Node<'_, '_>) -> Result<DemoSettings> {
    let mut settings = DemoSettings::default();
    if let Some(demo) = optional_text(node, "demo") {
        settings.demo = demo.parse()?;
    }
    settings.background = parse_color(optional_text(node, "background"), settings.background)?;

    if let Some(arena) = child(node, "arena") {
        let current = settings.arena;
        settings.arena.half_extent =
            parse_f32(optional_text(&arena, "half_extent"), current.half_extent)?;
        settings.arena.border = parse_f32(optional_text(&arena, "border"), current.border)?;
        settings.arena.wall_height =
            parse_f32(optional_text(&arena, "wall_height"), current.wall_height)?;
    }
    if let Some(player) = child(node, "player") {
        let current = settings.player;
        settings.player.speed = parse_f32(optional_text(&player, "speed"), current.speed)?;
        settings.player.jump_impulse =
            parse_f32(optional_text(&player, "jump_impulse"), current.jump_impulse)?;
        settings.player.mass = parse_f32(optional_text(&player, "mass"), current.mass)?;
    }
    if let Some(physics) = child(node, "physics") {
        let current = settings.physics;
        settings.physics.gravity = parse_vec3(optional_text(&physics, "gravity"), current.gravity)?;
        settings.physics.timestep =
            parse_f32(optional_text(&physics, "timestep"), current.timestep)?;
    }
    Ok(settings)
}

/// XYZ Euler angles in degrees, composed as Z·Y·X.
fn rotation_from_degrees(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::ZYX,
        degrees.z.to_radians(),
        degrees.y.to_radians(),
        degrees.x.to_radians(),
    )
}

fn child<'a, 'input>(node: &Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|c| c.has_tag_name(tag))
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_components(value: &str, what: &str) -> Result<Vec3> {
    let numbers = value
        .split_whitespace()
        .map(|component| {
            component
                .parse::<f32>()
                .map_err(|err| anyhow!("{what} component `{component}`: {err}"))
        })
        .collect::<Result<Vec<_>>>()?;
    match numbers.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(anyhow!(
            "{what} needs 3 components, found {}",
            numbers.len()
        )),
    }
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => parse_components(&value, "vector"),
        None => Ok(default),
    }
}

fn parse_color(value: Option<String>, default: Vec3) -> Result<Vec3> {
    match value {
        Some(value) => Ok(parse_components(&value, "color")? / 255.0),
        None => Ok(default),
    }
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float `{value}`: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene>
        <settings>
            <demo>physics</demo>
            <arena><half_extent>12</half_extent></arena>
            <player><speed>3.5</speed></player>
        </settings>
        <object>
            <name>Camera</name>
            <type>camera</type>
            <fov>90</fov>
            <target>0 1 0</target>
        </object>
        <object>
            <name>Light</name>
            <type>light</type>
            <intensity>2.5</intensity>
            <position>0 5 0</position>
            <color>255 128 0</color>
        </object>
        <object>
            <name>Box</name>
            <type>obstacle</type>
            <rotation>0 90 0</rotation>
            <size>2 4 6</size>
        </object>
    </scene>
    "#;

    #[test]
    fn parse_scene_populates_objects_and_lights() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.objects.len(), 3);
        let camera = scene.find_by_type("camera").unwrap();
        assert_eq!(camera.name, "Camera");
        assert_eq!(camera.fov, 90.0);
        assert_eq!(camera.target, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(scene.lights.len(), 1);
        let light = scene.lights[0];
        assert_eq!(light.position, Vec3::new(0.0, 5.0, 0.0));
        assert!((light.intensity - 2.5).abs() < f32::EPSILON);
        assert_eq!(light.color, Vec3::new(1.0, 128.0 / 255.0, 0.0));
    }

    #[test]
    fn settings_override_only_what_they_name() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.settings.demo, DemoKind::Physics);
        assert_eq!(scene.settings.arena.half_extent, 12.0);
        assert_eq!(scene.settings.arena.border, 1.0);
        assert_eq!(scene.settings.player.speed, 3.5);
        assert_eq!(scene.settings.player.jump_impulse, 5.0);
    }

    #[test]
    fn rotation_and_size_are_parsed() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let object = scene.find_by_type("obstacle").unwrap();
        assert_eq!(object.half_extents(), Vec3::new(1.0, 2.0, 3.0));
        let turned = object.rotation * Vec3::X;
        assert!((turned - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        let scene = Scene::from_xml("<scene><object><name>A</name></object></scene>").unwrap();
        assert_eq!(scene.settings, DemoSettings::default());
        assert_eq!(scene.objects[0].object_type, "mesh");
        assert!(scene.objects[0].is_solid());
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><type>mesh</type></object></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn short_vectors_and_bad_demo_kinds_are_errors() {
        let short = "<scene><object><name>A</name><position>1 2</position></object></scene>";
        assert!(Scene::from_xml(short).is_err());
        let bad_demo = "<scene><settings><demo>kart</demo></settings></scene>";
        assert!(Scene::from_xml(bad_demo).is_err());
        let bad_step =
            "<scene><settings><physics><timestep>0</timestep></physics></settings></scene>";
        assert!(Scene::from_xml(bad_step).is_err());
    }

    #[test]
    fn builtin_scenes_parse() {
        let cube = Scene::builtin(DemoKind::Static).unwrap();
        assert_eq!(cube.settings.demo, DemoKind::Static);
        assert!(cube.find_by_type("cube").is_some());
        assert_eq!(cube.floor_top(), Some(-1.0));

        let arena = Scene::builtin(DemoKind::Physics).unwrap();
        assert_eq!(arena.settings.demo, DemoKind::Physics);
        assert_eq!(arena.objects.len(), 6);
        assert_eq!(arena.lights.len(), 1);
        let player = arena.find_by_type("player").unwrap();
        assert_eq!(player.size, Vec3::splat(2.0));
    }
}
