//! Scene loading from the XML scene format.
//!
//! Ids in the file are 1-based; every reference is converted to a 0-based
//! index and checked against the element it points to, so the renderer can
//! index scene vectors directly.

use std::path::{Path, PathBuf};

use lumen_math::{Mat4, Vec2, Vec3};
use roxmltree::{Document, Node};
use thiserror::Error;

use super::parser::*;
use crate::mesh::{Mesh, MeshInstance};
use crate::scene::{Camera, Material, PointLight, Scene, Sphere, Transformation, Triangle};
use crate::texture::{Appearance, DecalMode, Interpolation, Texture, TextureCache, TextureError};

/// Errors that can occur during scene loading.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("Invalid {kind} reference {id} in <{element}> ({count} defined)")]
    InvalidReference {
        kind: &'static str,
        element: String,
        id: usize,
        count: usize,
    },
}

/// Result type for loading operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Load a scene file.
///
/// Texture paths are resolved relative to the scene file's directory.
///
/// # Example
///
/// ```ignore
/// use lumen_core::load_scene;
///
/// let scene = load_scene("scenes/simple.xml")?;
/// println!("{} cameras, {} primitives", scene.cameras.len(), scene.primitive_count());
/// ```
pub fn load_scene<P: AsRef<Path>>(path: P) -> LoadResult<Scene> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().map(|p| p.to_path_buf());
    load_scene_from_str(&content, base_dir)
}

/// Load a scene from XML text (useful for testing).
pub fn load_scene_from_str(content: &str, base_dir: Option<PathBuf>) -> LoadResult<Scene> {
    let doc = Document::parse(content).map_err(ParseError::from)?;
    let root = doc.root_element();
    if !root.has_tag_name("Scene") {
        return Err(ParseError::UnexpectedRoot(root.tag_name().name().to_string()).into());
    }

    let textures = match base_dir {
        Some(dir) => TextureCache::with_base_dir(dir),
        None => TextureCache::new(),
    };
    let mut builder = SceneBuilder {
        scene: Scene::default(),
        transformations: TransformLibrary::default(),
        textures,
    };
    builder.load(root)?;

    let image_count = builder.textures.image_count();
    let scene = builder.scene;
    log::info!(
        "Loaded scene: {} cameras, {} lights, {} materials, {} textures ({} images), {} primitives",
        scene.cameras.len(),
        scene.point_lights.len(),
        scene.materials.len(),
        scene.textures.len(),
        image_count,
        scene.primitive_count()
    );
    Ok(scene)
}

/// Scalings, translations and rotations, each numbered from 1 in the file.
#[derive(Default)]
struct TransformLibrary {
    scalings: Vec<Transformation>,
    translations: Vec<Transformation>,
    rotations: Vec<Transformation>,
}

/// Convert a 1-based id into an index into a collection of `count` items.
fn resolve(kind: &'static str, element: Node, id: usize, count: usize) -> LoadResult<usize> {
    if id == 0 || id > count {
        return Err(LoadError::InvalidReference {
            kind,
            element: element.tag_name().name().to_string(),
            id,
            count,
        });
    }
    Ok(id - 1)
}

struct SceneBuilder {
    scene: Scene,
    transformations: TransformLibrary,
    textures: TextureCache,
}

impl SceneBuilder {
    fn load(&mut self, root: Node) -> LoadResult<()> {
        self.scene.background_color = child_or(root, "BackgroundColor", Vec3::ZERO, vec3)?;
        self.scene.shadow_ray_epsilon = child_or(root, "ShadowRayEpsilon", 1e-3, float)?;
        self.scene.max_recursion_depth = child_or(root, "MaxRecursionDepth", 0, u32_value)?;

        if let Some(cameras) = child(root, "Cameras") {
            for node in children(cameras, "Camera") {
                let camera = self.load_camera(node)?;
                self.scene.cameras.push(camera);
            }
        }
        if let Some(lights) = child(root, "Lights") {
            self.load_lights(lights)?;
        }
        if let Some(materials) = child(root, "Materials") {
            for node in children(materials, "Material") {
                let material = self.load_material(node)?;
                self.scene.materials.push(material);
            }
        }
        if let Some(textures) = child(root, "Textures") {
            for node in children(textures, "Texture") {
                let texture = self.load_texture(node)?;
                self.scene.textures.push(texture);
            }
        }
        if let Some(transformations) = child(root, "Transformations") {
            self.load_transformations(transformations)?;
        }
        if let Some(vertices) = child(root, "VertexData") {
            self.scene.vertex_data = float_groups(vertices, 3)?
                .into_iter()
                .map(|v| Vec3::new(v[0], v[1], v[2]))
                .collect();
        }
        if let Some(tex_coords) = child(root, "TexCoordData") {
            self.scene.tex_coord_data = float_groups(tex_coords, 2)?
                .into_iter()
                .map(|v| Vec2::new(v[0], v[1]))
                .collect();
        }
        if let Some(objects) = child(root, "Objects") {
            self.load_objects(objects)?;
        }

        Ok(())
    }

    fn load_camera(&self, node: Node) -> LoadResult<Camera> {
        let resolution = u32s(required_child(node, "ImageResolution")?)?;
        let &[width, height] = resolution.as_slice() else {
            return Err(ParseError::WrongCount {
                element: "ImageResolution".to_string(),
                expected: "2".to_string(),
                found: resolution.len(),
            }
            .into());
        };
        if width == 0 || height == 0 {
            return Err(ParseError::EmptyImage {
                element: "ImageResolution".to_string(),
                width,
                height,
            }
            .into());
        }

        Ok(Camera {
            position: vec3(required_child(node, "Position")?)?,
            gaze: vec3(required_child(node, "Gaze")?)?,
            up: vec3(required_child(node, "Up")?)?,
            near_plane: vec4(required_child(node, "NearPlane")?)?,
            near_distance: float(required_child(node, "NearDistance")?)?,
            image_width: width,
            image_height: height,
            image_name: text(required_child(node, "ImageName")?).to_string(),
        })
    }

    fn load_lights(&mut self, lights: Node) -> LoadResult<()> {
        self.scene.ambient_light = child_or(lights, "AmbientLight", Vec3::ZERO, vec3)?;
        for node in children(lights, "PointLight") {
            self.scene.point_lights.push(PointLight {
                position: vec3(required_child(node, "Position")?)?,
                intensity: vec3(required_child(node, "Intensity")?)?,
            });
        }
        Ok(())
    }

    fn load_material(&self, node: Node) -> LoadResult<Material> {
        Ok(Material {
            ambient: vec3(required_child(node, "AmbientReflectance")?)?,
            diffuse: vec3(required_child(node, "DiffuseReflectance")?)?,
            specular: vec3(required_child(node, "SpecularReflectance")?)?,
            mirror: child_or(node, "MirrorReflectance", Vec3::ZERO, vec3)?,
            phong_exponent: child_or(node, "PhongExponent", 1.0, float)?,
        })
    }

    fn load_texture(&mut self, node: Node) -> LoadResult<Texture> {
        let image_name = text(required_child(node, "ImageName")?);
        let image = self.textures.load(image_name)?;

        let keyword = |name: &str| child(node, name).map(text).unwrap_or("");
        Ok(Texture::new(
            image,
            Interpolation::from_keyword(keyword("Interpolation")),
            DecalMode::from_keyword(keyword("DecalMode")),
            Appearance::from_keyword(keyword("Appearance")),
        ))
    }

    fn load_transformations(&mut self, node: Node) -> LoadResult<()> {
        for s in children(node, "Scaling") {
            self.transformations
                .scalings
                .push(Transformation::Scaling(vec3(s)?));
        }
        for t in children(node, "Translation") {
            self.transformations
                .translations
                .push(Transformation::Translation(vec3(t)?));
        }
        for r in children(node, "Rotation") {
            let values = floats(r)?;
            let &[angle_degrees, x, y, z] = values.as_slice() else {
                return Err(ParseError::WrongCount {
                    element: "Rotation".to_string(),
                    expected: "4".to_string(),
                    found: values.len(),
                }
                .into());
            };
            self.transformations.rotations.push(Transformation::Rotation {
                angle_degrees,
                axis: Vec3::new(x, y, z),
            });
        }
        Ok(())
    }

    /// Composite matrix of an object's optional `<Transformations>` child.
    fn object_transform(&self, object: Node) -> LoadResult<Mat4> {
        let Some(node) = child(object, "Transformations") else {
            return Ok(Mat4::IDENTITY);
        };

        let library = &self.transformations;
        let mut list = Vec::new();
        for (kind, id) in transform_refs(text(node))? {
            let (name, pool) = match kind {
                TransformKind::Scaling => ("scaling", &library.scalings),
                TransformKind::Translation => ("translation", &library.translations),
                TransformKind::Rotation => ("rotation", &library.rotations),
            };
            list.push(&pool[resolve(name, node, id, pool.len())?]);
        }
        Ok(Transformation::compose(list))
    }

    fn material_ref(&self, object: Node) -> LoadResult<usize> {
        let node = required_child(object, "Material")?;
        resolve("material", node, uint(node)?, self.scene.materials.len())
    }

    fn texture_ref(&self, object: Node) -> LoadResult<Option<usize>> {
        match child(object, "Texture") {
            Some(node) => {
                let id = resolve("texture", node, uint(node)?, self.scene.textures.len())?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    fn vertex_ref(&self, element: Node, id: usize) -> LoadResult<usize> {
        resolve("vertex", element, id, self.scene.vertex_data.len())
    }

    fn load_objects(&mut self, objects: Node) -> LoadResult<()> {
        for node in children(objects, "Mesh") {
            let faces_node = required_child(node, "Faces")?;
            let faces = uint_triples(faces_node)?
                .into_iter()
                .map(|face| {
                    Ok([
                        self.vertex_ref(faces_node, face[0])?,
                        self.vertex_ref(faces_node, face[1])?,
                        self.vertex_ref(faces_node, face[2])?,
                    ])
                })
                .collect::<LoadResult<Vec<_>>>()?;

            let mesh = Mesh::new(
                self.material_ref(node)?,
                self.texture_ref(node)?,
                faces,
                self.object_transform(node)?,
            );
            self.scene.meshes.push(mesh);
        }

        for node in children(objects, "MeshInstance") {
            let base_id = uint_attribute(node, "baseMeshId")?;
            let base_mesh_id = resolve("mesh", node, base_id, self.scene.meshes.len())?;
            let base = &self.scene.meshes[base_mesh_id];

            // Material and texture default to the base mesh's.
            let material_id = match child(node, "Material") {
                Some(_) => self.material_ref(node)?,
                None => base.material_id,
            };
            let texture_id = match child(node, "Texture") {
                Some(_) => self.texture_ref(node)?,
                None => base.texture_id,
            };

            let instance = MeshInstance::new(
                base_mesh_id,
                material_id,
                texture_id,
                self.object_transform(node)?,
            );
            self.scene.mesh_instances.push(instance);
        }

        for node in children(objects, "Triangle") {
            let indices_node = required_child(node, "Indices")?;
            let ids = uints(indices_node)?;
            let &[a, b, c] = ids.as_slice() else {
                return Err(ParseError::WrongCount {
                    element: "Indices".to_string(),
                    expected: "3".to_string(),
                    found: ids.len(),
                }
                .into());
            };

            let triangle = Triangle {
                material_id: self.material_ref(node)?,
                texture_id: self.texture_ref(node)?,
                indices: [
                    self.vertex_ref(indices_node, a)?,
                    self.vertex_ref(indices_node, b)?,
                    self.vertex_ref(indices_node, c)?,
                ],
                transform: self.object_transform(node)?,
            };
            self.scene.triangles.push(triangle);
        }

        for node in children(objects, "Sphere") {
            let center_node = required_child(node, "Center")?;
            let sphere = Sphere {
                material_id: self.material_ref(node)?,
                texture_id: self.texture_ref(node)?,
                center: self.vertex_ref(center_node, uint(center_node)?)?,
                radius: float(required_child(node, "Radius")?)?,
                transform: self.object_transform(node)?,
            };
            self.scene.spheres.push(sphere);
        }

        Ok(())
    }
}
