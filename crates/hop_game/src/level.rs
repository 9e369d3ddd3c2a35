//! The demo level: procedural construction plus per-frame gameplay.
//!
//! `DemoLevel::build` issues every asset and scene call needed to assemble
//! the level, then resolves the handles per-frame code needs (player, camera,
//! hoppers, grading LUTs) exactly once. `update` consumes one `FrameInput`
//! and touches the scene only through those handles.

use fastrand::Rng;
use glam::{Vec2, Vec3};
use hop_core::hop::HopTimer;
use hop_core::lighting::{ColorGrading, LightingState};
use std::path::Path;

use crate::assets::{
    AssetStore, Filter, Handle, Material, Mesh, MeshParam, Texture, TextureKind, WrapMode,
};
use crate::controller::{ControllerConfig, FrameInput, PlayerController};
use crate::hopping::HopRoster;
use crate::scene::{
    euler_deg_to_quat, load_scene_from_path, BodyType, Collider, ColliderShape, Component,
    EntityId, Light, ParticleEmitter, Scene, Skybox, TriggerFlags,
};

pub const PLAYER_NAME: &str = "player";

/// Objects that hop, in seeding order. The first one waits out a warm-up
/// before its first hop; the rest hop on the first frame.
pub const HOPPER_NAMES: [&str; 8] = [
    "Specular Object",
    "Foliage Sphere",
    "Foliage Box",
    "Toon Object",
    "Displacement Object",
    "Multitextured Object",
    "Normal Mapped Object",
    "Monkey",
];

const FIRST_HOP_WARM_UP: f32 = 2.0;

const LUT_COOL: &str = "luts/cool.CUBE";
const LUT_WARM: &str = "luts/warm.CUBE";
const LUT_CUSTOM: &str = "luts/custom.CUBE";

const BASIC_VS: &str = "shaders/vertex_shaders/basic.glsl";

/// 3D lookup tables used for each color grading look.
#[derive(Debug, Clone, Copy)]
pub struct GradingLuts {
    pub warm: Handle<Texture>,
    pub cool: Handle<Texture>,
    pub custom: Handle<Texture>,
}

impl GradingLuts {
    fn create(assets: &mut AssetStore) -> Self {
        Self {
            warm: assets.create_texture_3d(LUT_WARM),
            cool: assets.create_texture_3d(LUT_COOL),
            custom: assets.create_texture_3d(LUT_CUSTOM),
        }
    }

    fn resolve(assets: &AssetStore) -> Result<Self, String> {
        let find = |path: &str| {
            assets
                .find_texture(TextureKind::Texture3D, path)
                .ok_or_else(|| format!("Asset manifest is missing color LUT '{path}'"))
        };
        Ok(Self {
            warm: find(LUT_WARM)?,
            cool: find(LUT_COOL)?,
            custom: find(LUT_CUSTOM)?,
        })
    }

    pub fn for_grading(&self, grading: ColorGrading) -> Option<Handle<Texture>> {
        match grading {
            ColorGrading::Neutral => None,
            ColorGrading::Warm => Some(self.warm),
            ColorGrading::Cool => Some(self.cool),
            ColorGrading::Custom => Some(self.custom),
        }
    }
}

#[derive(Debug)]
pub struct DemoLevel {
    pub player: EntityId,
    pub camera: EntityId,
    pub hoppers: HopRoster,
    pub controller: PlayerController,
    pub lighting: LightingState,
    pub luts: GradingLuts,
}

impl DemoLevel {
    /// Load the saved scene and manifest when `load_from_disk` is set and both
    /// files exist; otherwise build the level procedurally and save it.
    pub fn load_or_build(
        scene_path: &Path,
        manifest_path: &Path,
        load_from_disk: bool,
    ) -> Result<(AssetStore, Scene, DemoLevel), String> {
        if load_from_disk && scene_path.exists() && manifest_path.exists() {
            let assets = AssetStore::load_manifest(manifest_path)?;
            let mut scene = load_scene_from_path(scene_path)?;
            let level = Self::attach(&assets, &mut scene)?;
            log::info!(
                "Loaded level from {} ({} objects, {} assets)",
                scene_path.display(),
                scene.len(),
                assets.len()
            );
            return Ok((assets, scene, level));
        }

        let mut assets = AssetStore::new();
        let mut scene = Scene::new();
        let level = Self::build(&mut assets, &mut scene);
        assets.save_manifest(manifest_path)?;
        scene.save(scene_path)?;
        Ok((assets, scene, level))
    }

    /// Resolve handles on an already populated scene.
    pub fn attach(assets: &AssetStore, scene: &mut Scene) -> Result<Self, String> {
        check_asset_references(assets, scene)?;
        let player = scene
            .find_by_name(PLAYER_NAME)
            .ok_or_else(|| format!("Scene has no object named '{PLAYER_NAME}'"))?;
        let mut hoppers = HopRoster::new();
        for (i, name) in HOPPER_NAMES.iter().enumerate() {
            let entity = scene
                .find_by_name(name)
                .ok_or_else(|| format!("Scene has no hopper named '{name}'"))?;
            let warm_up = if i == 0 { FIRST_HOP_WARM_UP } else { 0.0 };
            hoppers.insert(entity, HopTimer::new(warm_up));
        }

        let level = Self {
            player,
            camera: scene.main_camera,
            hoppers,
            controller: PlayerController::new(ControllerConfig::default()),
            lighting: LightingState::default(),
            luts: GradingLuts::resolve(assets)?,
        };
        level.push_lighting(scene);
        level.place_camera(scene);
        Ok(level)
    }

    pub fn build(assets: &mut AssetStore, scene: &mut Scene) -> Self {
        // --- Shaders -----------------------------------------------------------
        let reflective = assets.create_shader(
            BASIC_VS,
            "shaders/fragment_shaders/frag_environment_reflective.glsl",
        );
        assets.set_shader_debug_name(reflective, "Reflective");
        let blinn_phong = assets.create_shader(
            BASIC_VS,
            "shaders/fragment_shaders/frag_blinn_phong_textured.glsl",
        );
        assets.set_shader_debug_name(blinn_phong, "Blinn-phong");
        let specular = assets.create_shader(
            BASIC_VS,
            "shaders/fragment_shaders/textured_specular.glsl",
        );
        assets.set_shader_debug_name(specular, "Textured-Specular");
        let foliage = assets.create_shader(
            "shaders/vertex_shaders/foliage.glsl",
            "shaders/fragment_shaders/screendoor_transparency.glsl",
        );
        assets.set_shader_debug_name(foliage, "Foliage");
        let toon = assets.create_shader(BASIC_VS, "shaders/fragment_shaders/toon_shading.glsl");
        assets.set_shader_debug_name(toon, "Toon Shader");
        let displacement = assets.create_shader(
            "shaders/vertex_shaders/displacement_mapping.glsl",
            "shaders/fragment_shaders/frag_tangentspace_normal_maps.glsl",
        );
        assets.set_shader_debug_name(displacement, "Displacement Mapping");
        let tangent_space = assets.create_shader(
            BASIC_VS,
            "shaders/fragment_shaders/frag_tangentspace_normal_maps.glsl",
        );
        assets.set_shader_debug_name(tangent_space, "Tangent Space Mapping");
        let multi_texture = assets.create_shader(
            "shaders/vertex_shaders/vert_multitextured.glsl",
            "shaders/fragment_shaders/frag_multitextured.glsl",
        );
        assets.set_shader_debug_name(multi_texture, "Multitexturing");
        let skybox_shader = assets.create_shader(
            "shaders/vertex_shaders/skybox_vert.glsl",
            "shaders/fragment_shaders/skybox_frag.glsl",
        );

        // --- Meshes and textures -----------------------------------------------
        let monkey_mesh = assets.create_mesh_file("Monkey.obj");
        let box_texture = assets.create_texture_2d("textures/box-diffuse.png");
        let box_spec = assets.create_texture_2d("textures/box-specular.png");
        let monkey_tex = assets.create_texture_2d("textures/monkey-uvMap.png");
        let leaf_tex = assets.create_texture_2d("textures/leaves.png");
        if let Some(texture) = assets.texture_mut(leaf_tex) {
            texture.min_filter = Filter::Nearest;
            texture.mag_filter = Filter::Nearest;
        }
        let toon_lut = assets.create_texture_1d("luts/toon-1D.png");
        if let Some(texture) = assets.texture_mut(toon_lut) {
            texture.wrap = WrapMode::ClampToEdge;
        }
        let ocean = assets.create_texture_cube("cubemaps/ocean/ocean.jpg");
        let luts = GradingLuts::create(assets);
        let displacement_map = assets.create_texture_2d("textures/displacement_map.png");
        let normal_map = assets.create_texture_2d("textures/normal_map.png");
        let bricks = assets.create_texture_2d("textures/bricks_diffuse.png");
        let sand = assets.create_texture_2d("textures/terrain/sand.png");
        let grass = assets.create_texture_2d("textures/terrain/grass.png");

        // The ocean cubemap is Y-up; rotate it into the Z-up world.
        scene.skybox = Some(Skybox {
            texture: ocean,
            shader: skybox_shader,
            rotation: euler_deg_to_quat(Vec3::new(90.0, 0.0, 0.0)),
        });
        scene.color_lut = Some(luts.cool);

        // --- Materials ---------------------------------------------------------
        let box_material = assets.create_material(blinn_phong, "Box");
        let monkey_material = assets.create_material(reflective, "Monkey");
        let specular_material = assets.create_material(specular, "Box-Specular");
        let foliage_material = assets.create_material(foliage, "Foliage Shader");
        let toon_material = assets.create_material(toon, "Toon");
        let displacement_material = assets.create_material(displacement, "Displacement Map");
        let normal_map_material = assets.create_material(tangent_space, "Tangent Space Normal Map");
        let multi_texture_material = assets.create_material(multi_texture, "Multitexturing");

        if let Some(m) = assets.material_mut(box_material) {
            m.set("u_Material.Diffuse", box_texture)
                .set("u_Material.Shininess", 0.1f32);
        }
        if let Some(m) = assets.material_mut(monkey_material) {
            m.set("u_Material.Diffuse", monkey_tex)
                .set("u_Material.Shininess", 0.5f32);
        }
        if let Some(m) = assets.material_mut(specular_material) {
            m.set("u_Material.Diffuse", box_texture)
                .set("u_Material.Specular", box_spec);
        }
        if let Some(m) = assets.material_mut(foliage_material) {
            m.set("u_Material.Diffuse", leaf_tex)
                .set("u_Material.Shininess", 0.1f32)
                .set("u_Material.Threshold", 0.1f32)
                .set("u_WindDirection", Vec3::new(1.0, 1.0, 0.0))
                .set("u_WindStrength", 0.5f32)
                .set("u_VerticalScale", 1.0f32)
                .set("u_WindSpeed", 1.0f32);
        }
        if let Some(m) = assets.material_mut(toon_material) {
            m.set("u_Material.Diffuse", box_texture)
                .set("s_ToonTerm", toon_lut)
                .set("u_Material.Shininess", 0.1f32)
                .set("u_Material.Steps", 8);
        }
        if let Some(m) = assets.material_mut(displacement_material) {
            m.set("u_Material.Diffuse", bricks)
                .set("s_Heightmap", displacement_map)
                .set("s_NormalMap", normal_map)
                .set("u_Material.Shininess", 0.5f32)
                .set("u_Scale", 0.1f32);
        }
        if let Some(m) = assets.material_mut(normal_map_material) {
            m.set("u_Material.Diffuse", bricks)
                .set("s_NormalMap", normal_map)
                .set("u_Material.Shininess", 0.5f32)
                .set("u_Scale", 0.1f32);
        }
        if let Some(m) = assets.material_mut(multi_texture_material) {
            m.set("u_Material.DiffuseA", sand)
                .set("u_Material.DiffuseB", grass)
                .set("u_Material.Shininess", 0.5f32)
                .set("u_Scale", 0.1f32);
        }

        // --- Lights and camera -------------------------------------------------
        scene.lights = vec![
            Light {
                range: 100.0,
                ..Light::new(Vec3::new(0.0, -6.5, 12.0), Vec3::ONE)
            },
            Light::new(Vec3::new(1.0, 0.0, 3.0), Vec3::new(0.2, 0.8, 0.1)),
            Light::new(Vec3::new(0.0, 1.0, 3.0), Vec3::new(1.0, 0.2, 0.1)),
        ];

        let camera = scene.main_camera;
        scene.set_position(camera, Vec3::new(-9.0, -6.0, 15.0));
        scene.set_rotation_deg(camera, Vec3::new(90.0, 0.0, 90.0));

        // --- Shared meshes -----------------------------------------------------
        let sphere = assets.create_mesh_generated(vec![MeshParam::ico_sphere(5)]);
        let unit_cube = assets.create_mesh_generated(vec![MeshParam::cube(Vec3::ZERO)]);

        // --- Ground ------------------------------------------------------------
        let plane = scene.create_object("Plane");
        scene.set_position(plane, Vec3::new(0.17, -6.5, 0.0));
        scene.set_scale(plane, Vec3::new(1.0, 20.0, 1.0));
        let tiled = assets.create_mesh_generated(vec![MeshParam::plane(
            Vec2::splat(100.0),
            Vec2::splat(20.0),
        )]);
        add_render(scene, plane, tiled, box_material);
        scene.add_component(
            plane,
            Component::RigidBody {
                body: BodyType::Static,
                colliders: vec![Collider::new(ColliderShape::Box {
                    half_extents: Vec3::new(50.0, 50.0, 1.0),
                })
                .with_offset(Vec3::new(0.0, 0.0, -1.0))],
            },
        );

        // --- Demo objects, all hoppers ------------------------------------------
        let demo_parent = scene.create_object("Demo Parent");
        let foliage_box_mesh =
            assets.create_mesh_generated(vec![MeshParam::cube(Vec3::new(0.0, 0.0, 0.5))]);
        let demo_objects = [
            ("Specular Object", Vec3::new(0.0, -4.0, 1.0), unit_cube, specular_material),
            ("Foliage Sphere", Vec3::new(-4.0, -4.0, 1.0), sphere, foliage_material),
            ("Foliage Box", Vec3::new(-6.0, -4.0, 1.0), foliage_box_mesh, foliage_material),
            ("Toon Object", Vec3::new(-2.0, -4.0, 1.0), sphere, toon_material),
            ("Displacement Object", Vec3::new(2.0, -4.0, 1.0), sphere, displacement_material),
            ("Multitextured Object", Vec3::new(4.0, -4.0, 1.0), sphere, multi_texture_material),
            ("Normal Mapped Object", Vec3::new(6.0, -4.0, 1.0), sphere, normal_map_material),
            ("Monkey", Vec3::new(-8.0, -4.0, 1.0), monkey_mesh, monkey_material),
        ];
        let mut hoppers = HopRoster::new();
        for (i, (name, position, mesh, material)) in demo_objects.into_iter().enumerate() {
            let object = scene.create_object(name);
            scene.set_position(object, position);
            add_render(scene, object, mesh, material);
            if let Err(err) = scene.add_child(demo_parent, object) {
                log::error!("Failed to attach '{name}' to demo parent: {err}");
            }
            let warm_up = if i == 0 { FIRST_HOP_WARM_UP } else { 0.0 };
            hoppers.insert(object, HopTimer::new(warm_up));
        }

        // --- Trigger volume ----------------------------------------------------
        let trigger = scene.create_object("Trigger");
        scene.add_component(
            trigger,
            Component::TriggerVolume {
                flags: TriggerFlags::default(),
                colliders: vec![Collider::new(ColliderShape::Cylinder {
                    size: Vec3::new(3.0, 3.0, 1.0),
                })
                .with_offset(Vec3::new(0.0, 0.0, 0.5))],
            },
        );
        scene.add_component(trigger, Component::TriggerEnterBehaviour);

        // --- Floor and walls ---------------------------------------------------
        let floor = scene.create_object("Multitextured floor");
        scene.set_position(floor, Vec3::new(0.0, -27.5, -0.45));
        scene.set_scale(floor, Vec3::new(25.0, 25.0, 1.0));
        add_render(scene, floor, unit_cube, multi_texture_material);

        let walls = [
            ("Displacement Wall", Vec3::new(0.0, 5.0, 9.0), Vec3::ZERO),
            ("Displacement Wall2", Vec3::new(10.0, -5.0, 5.0), Vec3::new(0.0, 0.0, 90.0)),
            ("Displacement Wall3", Vec3::new(-10.0, -5.0, -1.0), Vec3::new(0.0, 0.0, 90.0)),
        ];
        for (name, position, rotation_deg) in walls {
            let wall = scene.create_object(name);
            scene.set_position(wall, position);
            scene.set_scale(wall, Vec3::new(20.0, 1.0, 20.0));
            scene.set_rotation_deg(wall, rotation_deg);
            add_render(scene, wall, unit_cube, displacement_material);
            add_box_body(scene, wall, BodyType::Static);
        }

        // --- Player --------------------------------------------------------------
        let player = scene.create_object(PLAYER_NAME);
        scene.set_position(player, Vec3::new(1.5, 0.0, 1.0));
        scene.set_scale(player, Vec3::splat(1.5));
        add_render(scene, player, unit_cube, specular_material);
        add_box_body(scene, player, BodyType::Kinematic);

        // --- Particles -----------------------------------------------------------
        let particles = scene.create_object("Particles");
        scene.add_component(
            particles,
            Component::ParticleSystem {
                emitters: vec![ParticleEmitter {
                    position: Vec3::ZERO,
                    velocity: Vec3::new(0.0, -1.0, 10.0),
                    lifetime: 10.0,
                    color: [0.0, 1.0, 0.0, 1.0],
                }],
            },
        );

        let level = Self {
            player,
            camera,
            hoppers,
            controller: PlayerController::new(ControllerConfig::default()),
            lighting: LightingState::default(),
            luts,
        };
        level.push_lighting(scene);
        level.place_camera(scene);

        log::info!(
            "Built demo level: {} objects ({} rendered), {} assets ({} materials), {} hoppers",
            scene.len(),
            scene.objects().filter(|(_, o)| o.has_render()).count(),
            assets.len(),
            assets.count_of("material"),
            level.hoppers.len()
        );
        level
    }

    pub fn update(&mut self, dt: f32, input: &FrameInput, scene: &mut Scene, rng: &mut Rng) {
        if input.toggle_camera {
            let mode = self.controller.toggle_camera();
            log::info!("Camera: {mode}");
        }

        if let Some(position) = scene.position(self.player) {
            let moved = self.controller.step(input, dt, position);
            scene.set_position(self.player, moved);
        }
        self.place_camera(scene);

        if self.lighting.apply(input.lighting) {
            log::info!("Lighting: {}", self.lighting);
            self.push_lighting(scene);
        }

        self.hoppers.update(dt, scene, rng);
    }

    fn place_camera(&self, scene: &mut Scene) {
        let Some(player) = scene.position(self.player) else {
            return;
        };
        let pose = self.controller.camera_pose(player);
        scene.set_position(self.camera, pose.position);
        scene.look_at(self.camera, pose.target);
    }

    fn push_lighting(&self, scene: &mut Scene) {
        scene.set_uniform("u_LightingMode", self.lighting.mode.shader_index());
        scene.set_uniform("u_DiffuseRamp", self.lighting.diffuse_ramp);
        scene.set_uniform("u_SpecularRamp", self.lighting.specular_ramp);
        scene.set_uniform("u_ColorGrading", self.lighting.grading.shader_index());
        if let Some(lut) = self.luts.for_grading(self.lighting.grading) {
            scene.color_lut = Some(lut);
        }
    }
}

/// Every handle the scene holds must resolve in the store it was loaded with.
fn check_asset_references(assets: &AssetStore, scene: &Scene) -> Result<(), String> {
    for (_, object) in scene.objects() {
        for component in &object.components {
            let Component::Render { mesh, material } = component else {
                continue;
            };
            if assets.mesh(*mesh).is_none() {
                return Err(format!(
                    "Object '{}' references mesh {} missing from the asset manifest",
                    object.name,
                    mesh.id()
                ));
            }
            if assets.material(*material).is_none() {
                return Err(format!(
                    "Object '{}' references material {} missing from the asset manifest",
                    object.name,
                    material.id()
                ));
            }
        }
    }
    if let Some(skybox) = &scene.skybox {
        if assets.texture(skybox.texture).is_none() || assets.shader(skybox.shader).is_none() {
            return Err("Skybox references assets missing from the asset manifest".to_string());
        }
    }
    if let Some(lut) = scene.color_lut {
        if assets.texture(lut).is_none() {
            return Err(format!(
                "Color LUT {} is missing from the asset manifest",
                lut.id()
            ));
        }
    }
    Ok(())
}

fn add_render(scene: &mut Scene, entity: EntityId, mesh: Handle<Mesh>, material: Handle<Material>) {
    scene.add_component(entity, Component::Render { mesh, material });
}

fn add_box_body(scene: &mut Scene, entity: EntityId, body: BodyType) {
    scene.add_component(
        entity,
        Component::RigidBody {
            body,
            colliders: vec![Collider::unit_box()],
        },
    );
}
