//! Typed asset store standing in for the engine's resource manager.
//!
//! Assets are plain descriptions (paths, filter modes, mesh builder params,
//! material uniforms); nothing is decoded or uploaded here. Callers get a
//! typed `Handle<T>` back and the store persists everything it has handed out
//! as a JSON manifest.
//!
//! Identity rules:
//!  - File-backed assets (shaders, textures, mesh files) are cached by their
//!    source key and get a UUID v5 derived from it, so the same path always
//!    yields the same handle, across runs as well as within one.
//!  - Generated meshes and materials are never cached and get a UUID v4.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::path::Path;
use uuid::Uuid;

const MANIFEST_VERSION: &str = "0.1";

pub struct Handle<T> {
    id: Uuid,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn from_id(id: Uuid) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

impl<T> Serialize for Handle<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Handle<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Handle::from_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderProgram {
    pub vertex: String,
    pub fragment: String,
    #[serde(default)]
    pub debug_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureKind {
    Texture1D,
    Texture2D,
    Texture3D,
    Cube,
}

impl TextureKind {
    fn key_prefix(self) -> &'static str {
        match self {
            Self::Texture1D => "tex1d",
            Self::Texture2D => "tex2d",
            Self::Texture3D => "tex3d",
            Self::Cube => "cube",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    Linear,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    Repeat,
    ClampToEdge,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub kind: TextureKind,
    pub path: String,
    #[serde(default)]
    pub min_filter: Filter,
    #[serde(default)]
    pub mag_filter: Filter,
    #[serde(default)]
    pub wrap: WrapMode,
}

/// Procedural mesh builder parameters, appended in order to one mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MeshParam {
    Plane {
        center: Vec3,
        normal: Vec3,
        tangent: Vec3,
        size: Vec2,
        uv_scale: Vec2,
    },
    Cube {
        center: Vec3,
        scale: Vec3,
    },
    IcoSphere {
        center: Vec3,
        radius: Vec3,
        tessellation: u32,
    },
}

impl MeshParam {
    pub fn plane(size: Vec2, uv_scale: Vec2) -> Self {
        Self::Plane {
            center: Vec3::ZERO,
            normal: Vec3::Z,
            tangent: Vec3::X,
            size,
            uv_scale,
        }
    }

    pub fn cube(center: Vec3) -> Self {
        Self::Cube {
            center,
            scale: Vec3::ONE,
        }
    }

    pub fn ico_sphere(tessellation: u32) -> Self {
        Self::IcoSphere {
            center: Vec3::ZERO,
            radius: Vec3::ONE,
            tessellation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Mesh {
    File { path: String },
    Generated { params: Vec<MeshParam> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Texture(Handle<Texture>),
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Handle<Texture>> for UniformValue {
    fn from(value: Handle<Texture>) -> Self {
        Self::Texture(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub shader: Handle<ShaderProgram>,
    #[serde(default)]
    pub uniforms: BTreeMap<String, UniformValue>,
}

impl Material {
    pub fn set(&mut self, uniform: &str, value: impl Into<UniformValue>) -> &mut Self {
        self.uniforms.insert(uniform.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    Shader(ShaderProgram),
    Texture(Texture),
    Mesh(Mesh),
    Material(Material),
}

impl Asset {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Shader(_) => "shader",
            Self::Texture(_) => "texture",
            Self::Mesh(_) => "mesh",
            Self::Material(_) => "material",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: String,
    assets: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    id: Uuid,
    #[serde(flatten)]
    asset: Asset,
}

#[derive(Debug, Default)]
pub struct AssetStore {
    assets: BTreeMap<Uuid, Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn count_of(&self, type_name: &str) -> usize {
        self.assets
            .values()
            .filter(|asset| asset.type_name() == type_name)
            .count()
    }

    pub fn create_shader(&mut self, vertex: &str, fragment: &str) -> Handle<ShaderProgram> {
        let id = file_asset_id(&format!("shader:{vertex}|{fragment}"));
        self.assets.entry(id).or_insert_with(|| {
            Asset::Shader(ShaderProgram {
                vertex: vertex.to_string(),
                fragment: fragment.to_string(),
                debug_name: None,
            })
        });
        Handle::from_id(id)
    }

    pub fn shader(&self, handle: Handle<ShaderProgram>) -> Option<&ShaderProgram> {
        match self.assets.get(&handle.id) {
            Some(Asset::Shader(shader)) => Some(shader),
            _ => None,
        }
    }

    pub fn set_shader_debug_name(&mut self, handle: Handle<ShaderProgram>, name: &str) {
        if let Some(Asset::Shader(shader)) = self.assets.get_mut(&handle.id) {
            shader.debug_name = Some(name.to_string());
        }
    }

    pub fn create_texture(&mut self, kind: TextureKind, path: &str) -> Handle<Texture> {
        let id = file_asset_id(&texture_key(kind, path));
        self.assets.entry(id).or_insert_with(|| {
            Asset::Texture(Texture {
                kind,
                path: path.to_string(),
                min_filter: Filter::default(),
                mag_filter: Filter::default(),
                wrap: WrapMode::default(),
            })
        });
        Handle::from_id(id)
    }

    pub fn create_texture_1d(&mut self, path: &str) -> Handle<Texture> {
        self.create_texture(TextureKind::Texture1D, path)
    }

    pub fn create_texture_2d(&mut self, path: &str) -> Handle<Texture> {
        self.create_texture(TextureKind::Texture2D, path)
    }

    pub fn create_texture_3d(&mut self, path: &str) -> Handle<Texture> {
        self.create_texture(TextureKind::Texture3D, path)
    }

    pub fn create_texture_cube(&mut self, path: &str) -> Handle<Texture> {
        self.create_texture(TextureKind::Cube, path)
    }

    /// Look up a previously created texture without creating it.
    pub fn find_texture(&self, kind: TextureKind, path: &str) -> Option<Handle<Texture>> {
        let id = file_asset_id(&texture_key(kind, path));
        match self.assets.get(&id) {
            Some(Asset::Texture(_)) => Some(Handle::from_id(id)),
            _ => None,
        }
    }

    pub fn texture(&self, handle: Handle<Texture>) -> Option<&Texture> {
        match self.assets.get(&handle.id) {
            Some(Asset::Texture(texture)) => Some(texture),
            _ => None,
        }
    }

    pub fn texture_mut(&mut self, handle: Handle<Texture>) -> Option<&mut Texture> {
        match self.assets.get_mut(&handle.id) {
            Some(Asset::Texture(texture)) => Some(texture),
            _ => None,
        }
    }

    pub fn create_mesh_file(&mut self, path: &str) -> Handle<Mesh> {
        let id = file_asset_id(&format!("mesh:{path}"));
        self.assets.entry(id).or_insert_with(|| {
            Asset::Mesh(Mesh::File {
                path: path.to_string(),
            })
        });
        Handle::from_id(id)
    }

    pub fn create_mesh_generated(&mut self, params: Vec<MeshParam>) -> Handle<Mesh> {
        let id = Uuid::new_v4();
        self.assets.insert(id, Asset::Mesh(Mesh::Generated { params }));
        Handle::from_id(id)
    }

    pub fn mesh(&self, handle: Handle<Mesh>) -> Option<&Mesh> {
        match self.assets.get(&handle.id) {
            Some(Asset::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn create_material(&mut self, shader: Handle<ShaderProgram>, name: &str) -> Handle<Material> {
        let id = Uuid::new_v4();
        self.assets.insert(
            id,
            Asset::Material(Material {
                name: name.to_string(),
                shader,
                uniforms: BTreeMap::new(),
            }),
        );
        Handle::from_id(id)
    }

    pub fn material(&self, handle: Handle<Material>) -> Option<&Material> {
        match self.assets.get(&handle.id) {
            Some(Asset::Material(material)) => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self, handle: Handle<Material>) -> Option<&mut Material> {
        match self.assets.get_mut(&handle.id) {
            Some(Asset::Material(material)) => Some(material),
            _ => None,
        }
    }

    pub fn save_manifest(&self, path: &Path) -> Result<(), String> {
        let manifest = Manifest {
            version: MANIFEST_VERSION.to_string(),
            assets: self
                .assets
                .iter()
                .map(|(id, asset)| ManifestEntry {
                    id: *id,
                    asset: asset.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| format!("Failed to serialize asset manifest: {e}"))?;
        fs::write(path, json)
            .map_err(|e| format!("Failed to write asset manifest {}: {e}", path.display()))?;
        log::info!(
            "Saved asset manifest {} ({} assets)",
            path.display(),
            self.assets.len()
        );
        Ok(())
    }

    pub fn load_manifest(path: &Path) -> Result<Self, String> {
        let raw = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read asset manifest {}: {e}", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&raw)
            .map_err(|e| format!("Failed to parse asset manifest {}: {e}", path.display()))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(format!(
                "Asset manifest validation failed: unsupported version '{}'",
                manifest.version
            ));
        }

        let mut store = Self::new();
        for entry in manifest.assets {
            if store.assets.insert(entry.id, entry.asset).is_some() {
                return Err(format!(
                    "Asset manifest validation failed: duplicate asset id '{}'",
                    entry.id
                ));
            }
        }
        // Materials must point at shaders that exist in the same manifest.
        for (id, asset) in &store.assets {
            if let Asset::Material(material) = asset {
                if store.shader(material.shader).is_none() {
                    return Err(format!(
                        "Asset manifest validation failed: material '{}' ({id}) references missing shader {}",
                        material.name,
                        material.shader.id()
                    ));
                }
            }
        }
        Ok(store)
    }
}

fn texture_key(kind: TextureKind, path: &str) -> String {
    format!("{}:{path}", kind.key_prefix())
}

fn file_asset_id(key: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
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
            "hop_assets_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn file_backed_assets_are_cached_by_path() {
        let mut store = AssetStore::new();
        let a = store.create_texture_2d("textures/box-diffuse.png");
        let b = store.create_texture_2d("textures/box-diffuse.png");
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);

        let s1 = store.create_shader("vs.glsl", "fs.glsl");
        let s2 = store.create_shader("vs.glsl", "fs.glsl");
        let s3 = store.create_shader("vs.glsl", "other.glsl");
        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
    }

    #[test]
    fn texture_kind_is_part_of_identity() {
        let mut store = AssetStore::new();
        let lut_1d = store.create_texture_1d("luts/shared.png");
        let tex_2d = store.create_texture_2d("luts/shared.png");
        assert_ne!(lut_1d, tex_2d);
        assert_eq!(
            store.find_texture(TextureKind::Texture1D, "luts/shared.png"),
            Some(lut_1d)
        );
        assert_eq!(store.find_texture(TextureKind::Cube, "luts/shared.png"), None);
    }

    #[test]
    fn file_ids_are_stable_across_stores() {
        let mut first = AssetStore::new();
        let mut second = AssetStore::new();
        assert_eq!(
            first.create_mesh_file("Monkey.obj"),
            second.create_mesh_file("Monkey.obj")
        );
    }

    #[test]
    fn generated_assets_are_never_shared() {
        let mut store = AssetStore::new();
        let shader = store.create_shader("vs.glsl", "fs.glsl");
        let m1 = store.create_mesh_generated(vec![MeshParam::cube(Vec3::ZERO)]);
        let m2 = store.create_mesh_generated(vec![MeshParam::cube(Vec3::ZERO)]);
        assert_ne!(m1, m2);
        let mat1 = store.create_material(shader, "Box");
        let mat2 = store.create_material(shader, "Box");
        assert_ne!(mat1, mat2);
        assert_eq!(store.count_of("mesh"), 2);
        assert_eq!(store.count_of("material"), 2);
    }

    #[test]
    fn material_uniforms_and_texture_settings_are_mutable() {
        let mut store = AssetStore::new();
        let shader = store.create_shader("vs.glsl", "fs.glsl");
        let leaves = store.create_texture_2d("textures/leaves.png");
        if let Some(texture) = store.texture_mut(leaves) {
            texture.min_filter = Filter::Nearest;
        }
        let material = store.create_material(shader, "Foliage");
        store
            .material_mut(material)
            .expect("material exists")
            .set("u_Material.Diffuse", leaves)
            .set("u_WindStrength", 0.5f32)
            .set("u_Material.Steps", 8);

        let mat = store.material(material).expect("material exists");
        assert_eq!(mat.uniforms.get("u_Material.Diffuse"), Some(&UniformValue::Texture(leaves)));
        assert_eq!(mat.uniforms.get("u_WindStrength"), Some(&UniformValue::Float(0.5)));
        assert_eq!(mat.uniforms.get("u_Material.Steps"), Some(&UniformValue::Int(8)));
        assert_eq!(
            store.texture(leaves).map(|t| t.min_filter),
            Some(Filter::Nearest)
        );
    }

    #[test]
    fn typed_lookup_rejects_wrong_kind() {
        let mut store = AssetStore::new();
        let shader = store.create_shader("vs.glsl", "fs.glsl");
        let material = store.create_material(shader, "Box");
        let as_texture: Handle<Texture> = Handle::from_id(material.id());
        assert!(store.texture(as_texture).is_none());
        assert!(store.material(material).is_some());
    }

    #[test]
    fn manifest_save_then_load_preserves_assets() {
        let path = temp_file_path("manifest");
        let mut store = AssetStore::new();
        let shader = store.create_shader("basic.glsl", "toon.glsl");
        store.set_shader_debug_name(shader, "Toon Shader");
        let lut = store.create_texture_1d("luts/toon-1D.png");
        let material = store.create_material(shader, "Toon");
        store
            .material_mut(material)
            .expect("material exists")
            .set("s_ToonTerm", lut);
        store.create_mesh_generated(vec![
            MeshParam::plane(Vec2::splat(100.0), Vec2::splat(20.0)),
            MeshParam::ico_sphere(5),
        ]);

        store.save_manifest(&path).expect("manifest should save");
        let loaded = AssetStore::load_manifest(&path).expect("manifest should load");
        assert_eq!(loaded.len(), store.len());
        assert_eq!(
            loaded.shader(shader).and_then(|s| s.debug_name.as_deref()),
            Some("Toon Shader")
        );
        assert_eq!(loaded.material(material), store.material(material));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn manifest_rejects_material_with_missing_shader() {
        let path = temp_file_path("dangling");
        let json = format!(
            r#"{{
              "version": "0.1",
              "assets": [
                {{ "id": "{}", "type": "material", "name": "Orphan", "shader": "{}" }}
              ]
            }}"#,
            Uuid::new_v4(),
            Uuid::new_v4()
        );
        fs::write(&path, json).expect("write manifest");
        let err = AssetStore::load_manifest(&path).expect_err("dangling shader should fail");
        assert!(err.contains("references missing shader"));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn manifest_rejects_unknown_version() {
        let path = temp_file_path("version");
        fs::write(&path, r#"{ "version": "9.9", "assets": [] }"#).expect("write manifest");
        let err = AssetStore::load_manifest(&path).expect_err("version should fail");
        assert!(err.contains("unsupported version"));

        let _ = fs::remove_file(path);
    }
}
