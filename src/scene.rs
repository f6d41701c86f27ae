//! Minimal render scene for the formats that export a scene graph rather
//! than raw geometry (OBJ and VRML).
//!
//! A window holds renderers, a renderer holds actors, an actor draws one mesh
//! with one surface property. There are no cameras or lights, nothing is
//! ever drawn on screen.

use crate::nalgebra_types::FloatField;
use crate::polymesh::PolygonMesh;

/// RGB colour with channels in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const BLACK: Colour = Colour {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub fn new(r: f32, g: f32, b: f32) -> Colour {
        Colour { r, g, b }
    }

    /// Channels clamped and scaled to bytes.
    pub fn to_rgb8(&self) -> [u8; 3] {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [byte(self.r), byte(self.g), byte(self.b)]
    }

    pub fn scaled(&self, factor: f32) -> Colour {
        Colour::new(self.r * factor, self.g * factor, self.b * factor)
    }
}

impl Default for Colour {
    fn default() -> Colour {
        Colour::WHITE
    }
}

/// Material of an actor.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceProperty {
    pub colour: Colour,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub specular_power: f32,
    pub opacity: f32,
}

impl Default for SurfaceProperty {
    fn default() -> SurfaceProperty {
        SurfaceProperty {
            colour: Colour::WHITE,
            ambient: 0.0,
            diffuse: 1.0,
            specular: 0.0,
            specular_power: 1.0,
            opacity: 1.0,
        }
    }
}

pub struct Actor<'a, T: FloatField> {
    mesh: &'a PolygonMesh<T>,
    pub property: SurfaceProperty,
}

impl<'a, T: FloatField> Actor<'a, T> {
    pub fn new(mesh: &'a PolygonMesh<T>) -> Actor<'a, T> {
        Actor {
            mesh,
            property: SurfaceProperty::default(),
        }
    }

    pub fn mesh(&self) -> &'a PolygonMesh<T> {
        self.mesh
    }
}

pub struct Renderer<'a, T: FloatField> {
    actors: Vec<Actor<'a, T>>,
    pub background: Colour,
}

impl<'a, T: FloatField> Renderer<'a, T> {
    pub fn new() -> Renderer<'a, T> {
        Renderer {
            actors: Vec::new(),
            background: Colour::BLACK,
        }
    }

    pub fn add_actor(&mut self, actor: Actor<'a, T>) {
        self.actors.push(actor);
    }

    pub fn actors(&self) -> &[Actor<'a, T>] {
        &self.actors
    }
}

impl<'a, T: FloatField> Default for Renderer<'a, T> {
    fn default() -> Self {
        Renderer::new()
    }
}

pub struct RenderWindow<'a, T: FloatField> {
    renderers: Vec<Renderer<'a, T>>,
    offscreen: bool,
}

impl<'a, T: FloatField> RenderWindow<'a, T> {
    pub fn new() -> RenderWindow<'a, T> {
        RenderWindow {
            renderers: Vec::new(),
            offscreen: true,
        }
    }

    /// One actor for the mesh in one renderer. This is all the exporters
    /// need.
    pub fn for_mesh(mesh: &'a PolygonMesh<T>, colour: Option<Colour>) -> RenderWindow<'a, T> {
        let mut actor = Actor::new(mesh);
        if let Some(colour) = colour {
            actor.property.colour = colour;
        }
        let mut renderer = Renderer::new();
        renderer.add_actor(actor);
        let mut window = RenderWindow::new();
        window.add_renderer(renderer);
        window
    }

    pub fn add_renderer(&mut self, renderer: Renderer<'a, T>) {
        self.renderers.push(renderer);
    }

    pub fn renderers(&self) -> &[Renderer<'a, T>] {
        &self.renderers
    }

    /// Every actor of every renderer, in order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor<'a, T>> {
        self.renderers.iter().flat_map(|r| r.actors().iter())
    }

    pub fn is_offscreen(&self) -> bool {
        self.offscreen
    }
}

impl<'a, T: FloatField> Default for RenderWindow<'a, T> {
    fn default() -> Self {
        RenderWindow::new()
    }
}
