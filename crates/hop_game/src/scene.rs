//! In-memory scene graph standing in for the engine's scene.
//!
//! Objects live in a flat `Vec` and are addressed by `EntityId` (their index),
//! which stays valid for the scene's lifetime because objects are never
//! removed. Name lookup exists for level setup; per-frame code holds ids.
//!
//! The scene is Z-up. Components are recorded data for the renderer and the
//! physics engine to consume; nothing here draws or simulates.

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::assets::{Handle, Material, Mesh, ShaderProgram, Texture, UniformValue};

const SCENE_VERSION: &str = "0.1";
const MAIN_CAMERA_NAME: &str = "Main Camera";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Plane { normal: Vec3 },
    Sphere { radius: f32 },
    Cylinder { size: Vec3 },
    ConvexMesh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    #[serde(flatten)]
    pub shape: ColliderShape,
    #[serde(default)]
    pub offset: Vec3,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            offset: Vec3::ZERO,
        }
    }

    /// Unit box, matching the engine's default box collider.
    pub fn unit_box() -> Self {
        Self::new(ColliderShape::Box {
            half_extents: Vec3::splat(0.5),
        })
    }

    pub fn with_offset(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    #[default]
    Static,
    Kinematic,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFlags {
    pub statics: bool,
    pub kinematics: bool,
    pub dynamics: bool,
}

impl Default for TriggerFlags {
    fn default() -> Self {
        Self {
            statics: false,
            kinematics: false,
            dynamics: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEmitter {
    pub position: Vec3,
    pub velocity: Vec3,
    pub lifetime: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Camera,
    Render {
        mesh: Handle<Mesh>,
        material: Handle<Material>,
    },
    RigidBody {
        #[serde(default)]
        body: BodyType,
        colliders: Vec<Collider>,
    },
    TriggerVolume {
        #[serde(default)]
        flags: TriggerFlags,
        colliders: Vec<Collider>,
    },
    TriggerEnterBehaviour,
    ParticleSystem {
        emitters: Vec<ParticleEmitter>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub parent: Option<EntityId>,
    #[serde(default)]
    pub children: Vec<EntityId>,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl GameObject {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            parent: None,
            children: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    pub fn has_render(&self) -> bool {
        self.components
            .iter()
            .any(|c| matches!(c, Component::Render { .. }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub position: Vec3,
    pub color: Vec3,
    #[serde(default = "default_light_range")]
    pub range: f32,
}

impl Light {
    pub fn new(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            range: default_light_range(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skybox {
    pub texture: Handle<Texture>,
    pub shader: Handle<ShaderProgram>,
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub version: String,
    objects: Vec<GameObject>,
    pub main_camera: EntityId,
    #[serde(default)]
    pub lights: Vec<Light>,
    #[serde(default)]
    pub skybox: Option<Skybox>,
    #[serde(default)]
    pub color_lut: Option<Handle<Texture>>,
    /// Frame-global shader uniforms (lighting mode, grading, ...).
    #[serde(default)]
    pub uniforms: BTreeMap<String, UniformValue>,
}

impl Scene {
    /// An empty scene already owns its main camera.
    pub fn new() -> Self {
        let mut camera = GameObject::new(MAIN_CAMERA_NAME);
        camera.components.push(Component::Camera);
        Self {
            version: SCENE_VERSION.to_string(),
            objects: vec![camera],
            main_camera: EntityId(0),
            lights: Vec::new(),
            skybox: None,
            color_lut: None,
            uniforms: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn create_object(&mut self, name: &str) -> EntityId {
        let id = EntityId(self.objects.len() as u32);
        self.objects.push(GameObject::new(name));
        id
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.objects
            .iter()
            .position(|o| o.name == name)
            .map(|index| EntityId(index as u32))
    }

    pub fn object(&self, id: EntityId) -> Option<&GameObject> {
        self.objects.get(id.index())
    }

    pub fn object_mut(&mut self, id: EntityId) -> Option<&mut GameObject> {
        self.objects.get_mut(id.index())
    }

    pub fn objects(&self) -> impl Iterator<Item = (EntityId, &GameObject)> {
        self.objects
            .iter()
            .enumerate()
            .map(|(index, object)| (EntityId(index as u32), object))
    }

    pub fn position(&self, id: EntityId) -> Option<Vec3> {
        self.object(id).map(|o| o.position)
    }

    pub fn position_mut(&mut self, id: EntityId) -> Option<&mut Vec3> {
        self.object_mut(id).map(|o| &mut o.position)
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) {
        if let Some(object) = self.object_mut(id) {
            object.position = position;
        }
    }

    pub fn set_scale(&mut self, id: EntityId, scale: Vec3) {
        if let Some(object) = self.object_mut(id) {
            object.scale = scale;
        }
    }

    /// Euler angles in degrees, applied X then Y then Z.
    pub fn set_rotation_deg(&mut self, id: EntityId, euler_deg: Vec3) {
        if let Some(object) = self.object_mut(id) {
            object.rotation = euler_deg_to_quat(euler_deg);
        }
    }

    /// Orient the object so its forward axis (-Z local, Z-up world) points at
    /// `target`. A target on top of the object leaves rotation unchanged.
    pub fn look_at(&mut self, id: EntityId, target: Vec3) {
        let Some(object) = self.object_mut(id) else {
            return;
        };
        let eye = object.position;
        let forward = target - eye;
        if forward.length_squared() < 1e-8 {
            return;
        }
        let up = if forward.normalize().cross(Vec3::Z).length_squared() < 1e-8 {
            Vec3::Y
        } else {
            Vec3::Z
        };
        let view = Mat4::look_at_rh(eye, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        object.rotation = rotation;
    }

    pub fn add_component(&mut self, id: EntityId, component: Component) {
        if let Some(object) = self.object_mut(id) {
            object.components.push(component);
        }
    }

    /// Reparent `child` under `parent`, detaching it from any previous parent.
    pub fn add_child(&mut self, parent: EntityId, child: EntityId) -> Result<(), String> {
        if parent == child {
            return Err(format!("Cannot parent object {} to itself", parent.index()));
        }
        if self.object(parent).is_none() || self.object(child).is_none() {
            return Err(format!(
                "Cannot parent object {} under {}: unknown object",
                child.index(),
                parent.index()
            ));
        }
        // Walking up from the new parent must not reach the child.
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(format!(
                    "Cannot parent object {} under its own descendant {}",
                    child.index(),
                    parent.index()
                ));
            }
            cursor = self.objects[current.index()].parent;
        }

        if let Some(old_parent) = self.objects[child.index()].parent {
            self.objects[old_parent.index()]
                .children
                .retain(|&c| c != child);
        }
        self.objects[child.index()].parent = Some(parent);
        self.objects[parent.index()].children.push(child);
        Ok(())
    }

    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        let object = self.object(id)?;
        let local = object.local_matrix();
        match object.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) {
        self.uniforms.insert(name.to_string(), value.into());
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        validate_scene(self)?;
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize scene: {e}"))?;
        fs::write(path, json)
            .map_err(|e| format!("Failed to write scene file {}: {e}", path.display()))?;
        log::info!("Saved scene {} ({} objects)", path.display(), self.objects.len());
        Ok(())
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_scene_from_path(scene_path: &Path) -> Result<Scene, String> {
    let raw = fs::read_to_string(scene_path)
        .map_err(|e| format!("Failed to read scene file {}: {e}", scene_path.display()))?;
    let scene: Scene = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse scene JSON {}: {e}", scene_path.display()))?;
    validate_scene(&scene)?;
    Ok(scene)
}

fn validate_scene(scene: &Scene) -> Result<(), String> {
    if scene.version != SCENE_VERSION {
        return Err(format!(
            "Scene validation failed: unsupported version '{}'",
            scene.version
        ));
    }
    if scene.objects.is_empty() {
        return Err("Scene validation failed: objects array is empty".to_string());
    }

    // Names are unique so that setup-time lookups are unambiguous.
    let mut names = HashSet::new();
    for (index, object) in scene.objects.iter().enumerate() {
        if object.name.is_empty() {
            return Err(format!(
                "Scene validation failed: object {index} has an empty name"
            ));
        }
        if !names.insert(object.name.as_str()) {
            return Err(format!(
                "Scene validation failed: duplicate object name '{}'",
                object.name
            ));
        }
        if let Some(parent) = object.parent {
            let Some(parent_object) = scene.objects.get(parent.index()) else {
                return Err(format!(
                    "Scene validation failed: object '{}' has unknown parent {}",
                    object.name,
                    parent.index()
                ));
            };
            if !parent_object.children.contains(&EntityId(index as u32)) {
                return Err(format!(
                    "Scene validation failed: parent '{}' does not list child '{}'",
                    parent_object.name, object.name
                ));
            }
        }
        for child in &object.children {
            let linked = scene
                .objects
                .get(child.index())
                .is_some_and(|c| c.parent == Some(EntityId(index as u32)));
            if !linked {
                return Err(format!(
                    "Scene validation failed: object '{}' lists child {} that does not point back",
                    object.name,
                    child.index()
                ));
            }
        }
    }

    // Parent chains must end at a root within `objects.len()` steps.
    for object in &scene.objects {
        let mut cursor = object.parent;
        let mut steps = 0;
        while let Some(parent) = cursor {
            steps += 1;
            if steps > scene.objects.len() {
                return Err(format!(
                    "Scene validation failed: parent cycle at '{}'",
                    object.name
                ));
            }
            cursor = scene.objects.get(parent.index()).and_then(|p| p.parent);
        }
    }

    let camera_ok = scene
        .objects
        .get(scene.main_camera.index())
        .is_some_and(|o| o.components.contains(&Component::Camera));
    if !camera_ok {
        return Err(format!(
            "Scene validation failed: main camera {} is missing or has no camera component",
            scene.main_camera.index()
        ));
    }

    Ok(())
}

pub fn euler_deg_to_quat(euler_deg: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        euler_deg.x.to_radians(),
        euler_deg.y.to_radians(),
        euler_deg.z.to_radians(),
    )
}

const fn default_scale() -> Vec3 {
    Vec3::ONE
}

const fn default_light_range() -> f32 {
    4.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "hop_scene_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn new_scene_owns_main_camera() {
        let scene = Scene::new();
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.find_by_name(MAIN_CAMERA_NAME), Some(scene.main_camera));
        let camera = scene.object(scene.main_camera).expect("camera exists");
        assert!(camera.components.contains(&Component::Camera));
    }

    #[test]
    fn find_by_name_returns_stable_handles() {
        let mut scene = Scene::new();
        let player = scene.create_object("player");
        let wall = scene.create_object("Wall");
        assert_eq!(scene.find_by_name("player"), Some(player));
        assert_eq!(scene.find_by_name("Wall"), Some(wall));
        assert_eq!(scene.find_by_name("missing"), None);
    }

    #[test]
    fn position_mut_edits_in_place() {
        let mut scene = Scene::new();
        let id = scene.create_object("hopper");
        scene.set_position(id, Vec3::new(1.0, 2.0, 1.0));
        if let Some(pos) = scene.position_mut(id) {
            pos.z += 0.25;
        }
        assert_eq!(scene.position(id), Some(Vec3::new(1.0, 2.0, 1.25)));
    }

    #[test]
    fn add_child_reparents_and_composes_world_position() {
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        let child = scene.create_object("child");
        scene.set_position(a, Vec3::new(10.0, 0.0, 0.0));
        scene.set_position(b, Vec3::new(0.0, 5.0, 0.0));
        scene.set_position(child, Vec3::new(1.0, 1.0, 1.0));

        scene.add_child(a, child).expect("first parent");
        let world = scene.world_position(child).expect("child exists");
        assert!((world - Vec3::new(11.0, 1.0, 1.0)).length() < 1e-5);

        scene.add_child(b, child).expect("reparent");
        assert!(scene.object(a).expect("a").children.is_empty());
        assert_eq!(scene.object(b).expect("b").children, vec![child]);
        let world = scene.world_position(child).expect("child exists");
        assert!((world - Vec3::new(1.0, 6.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn add_child_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        scene.add_child(a, b).expect("a -> b");
        let err = scene.add_child(b, a).expect_err("cycle should fail");
        assert!(err.contains("descendant"));
        assert!(scene.add_child(a, a).is_err());
    }

    #[test]
    fn look_at_points_forward_axis_at_target() {
        let mut scene = Scene::new();
        let camera = scene.main_camera;
        scene.set_position(camera, Vec3::new(-9.0, -6.0, 15.0));
        scene.look_at(camera, Vec3::ZERO);
        let rotation = scene.object(camera).expect("camera").rotation;
        let forward = rotation * Vec3::NEG_Z;
        let expected = (Vec3::ZERO - Vec3::new(-9.0, -6.0, 15.0)).normalize();
        assert!((forward - expected).length() < 1e-4);
    }

    #[test]
    fn look_at_straight_down_does_not_produce_nan() {
        let mut scene = Scene::new();
        let camera = scene.main_camera;
        scene.set_position(camera, Vec3::new(0.0, 0.0, 10.0));
        scene.look_at(camera, Vec3::ZERO);
        let rotation = scene.object(camera).expect("camera").rotation;
        assert!(rotation.is_finite());
        assert!(((rotation * Vec3::NEG_Z) - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn save_then_load_preserves_scene() {
        let path = temp_file_path("roundtrip");
        let mut scene = Scene::new();
        let parent = scene.create_object("Demo Parent");
        let child = scene.create_object("Toon Object");
        scene.set_position(child, Vec3::new(-2.0, -4.0, 1.0));
        scene.set_rotation_deg(child, Vec3::new(0.0, 0.0, 90.0));
        scene.add_child(parent, child).expect("parent");
        scene.add_component(
            child,
            Component::RigidBody {
                body: BodyType::Static,
                colliders: vec![Collider::unit_box().with_offset(Vec3::new(0.0, 0.0, -1.0))],
            },
        );
        scene.lights.push(Light::new(Vec3::new(0.0, -6.5, 12.0), Vec3::ONE));
        scene.set_uniform("u_LightingMode", 3);

        scene.save(&path).expect("scene should save");
        let loaded = load_scene_from_path(&path).expect("scene should load");
        assert_eq!(loaded, scene);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_rejects_duplicate_names() {
        let path = temp_file_path("dup_names");
        let mut scene = Scene::new();
        scene.create_object("twin");
        scene.create_object("twin");
        let json = serde_json::to_string(&scene).expect("serialize");
        fs::write(&path, json).expect("write scene");

        let err = load_scene_from_path(&path).expect_err("duplicate names should fail");
        assert!(err.contains("duplicate object name 'twin'"));
        assert!(scene.save(&path).is_err(), "save validates too");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_rejects_broken_parent_links() {
        let path = temp_file_path("broken_parent");
        let mut scene = Scene::new();
        let orphan = scene.create_object("orphan");
        scene.object_mut(orphan).expect("orphan").parent = Some(EntityId(0));
        let json = serde_json::to_string(&scene).expect("serialize");
        fs::write(&path, json).expect("write scene");

        let err = load_scene_from_path(&path).expect_err("one-sided link should fail");
        assert!(err.contains("does not list child 'orphan'"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn load_rejects_parent_cycle() {
        let path = temp_file_path("cycle");
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        scene.add_child(a, b).expect("a -> b");
        // Close the loop by hand; add_child refuses to.
        let obj_a = scene.object_mut(a).expect("a");
        obj_a.parent = Some(b);
        obj_a.children.push(b);
        scene.object_mut(b).expect("b").children.push(a);
        let json = serde_json::to_string(&scene).expect("serialize");
        fs::write(&path, json).expect("write scene");

        let err = load_scene_from_path(&path).expect_err("cycle should fail");
        assert!(err.contains("parent cycle"));
        assert!(scene.save(&path).is_err(), "save validates too");

        let _ = fs::remove_file(path);
    }

    #[test]
    fn validation_rejects_self_parent() {
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let obj = scene.object_mut(a).expect("a");
        obj.parent = Some(a);
        obj.children.push(a);
        let err = validate_scene(&scene).expect_err("self parent should fail");
        assert!(err.contains("parent cycle at 'a'"));
    }

    #[test]
    fn load_rejects_missing_camera_component() {
        let path = temp_file_path("no_camera");
        let mut scene = Scene::new();
        scene
            .object_mut(scene.main_camera)
            .expect("camera")
            .components
            .clear();
        let json = serde_json::to_string(&scene).expect("serialize");
        fs::write(&path, json).expect("write scene");

        let err = load_scene_from_path(&path).expect_err("camera should be required");
        assert!(err.contains("main camera"));

        let _ = fs::remove_file(path);
    }
}
