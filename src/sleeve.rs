use crate::graphics::{FrameBuffer, Rgb, Vertex};
use crate::manipulation::SleeveTransform;
use crate::math::{calculate_normal, multiply_matrices, multiply_matrix_vector, rotation_x, rotation_y};

/// Corner offsets of the unit sleeve with their texture coordinates
const CORNERS: [([f64; 2], [f64; 2]); 4] = [
    ([-0.5, -0.5], [0.0, 0.0]),
    ([0.5, -0.5], [1.0, 0.0]),
    ([0.5, 0.5], [1.0, 1.0]),
    ([-0.5, 0.5], [0.0, 1.0]),
];

/// Where and how large the sleeve is drawn on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleeveView {
    pub center: [f64; 2],
    /// Edge length at scale 1, in canvas pixels
    pub side: f64,
    /// Distance from the viewer to the sleeve plane
    pub perspective: f64,
}

impl SleeveView {
    pub fn new(center: [f64; 2], side: f64) -> Self {
        // Same ratio as a 384px element under a 1200px perspective
        SleeveView { center, side, perspective: side * 1200.0 / 384.0 }
    }

    fn light_position(&self) -> [f64; 3] {
        [-0.8 * self.side, -1.2 * self.side, 2.5 * self.side]
    }
}

/// Which printed side faces the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

/// Rotates, scales and projects the sleeve corners.
///
/// Returns the four vertices in corner order plus the face that is visible.
pub fn project(transform: &SleeveTransform, view: &SleeveView) -> ([Vertex; 4], Face) {
    let rotation = multiply_matrices(&rotation_x(transform.pitch), &rotation_y(transform.yaw));
    let size = view.side * transform.scale;

    let positions = CORNERS.map(|([x, y], _)| {
        multiply_matrix_vector(&rotation, &[x * size, y * size, 0.0])
    });

    let front_normal = multiply_matrix_vector(&rotation, &[0.0, 0.0, 1.0]);
    let face = if front_normal[2] >= 0.0 { Face::Front } else { Face::Back };
    let facing = calculate_normal(&positions[0], &positions[3], &positions[1]);
    let normal = if facing[2] >= 0.0 { facing } else { facing.map(|c| -c) };

    let mut vertices = [Vertex {
        position: [0.0; 3],
        screen_position: [0.0; 2],
        normal,
        uv: [0.0; 2],
    }; 4];
    for (vertex, (position, (_, uv))) in vertices.iter_mut().zip(positions.iter().zip(CORNERS)) {
        // Vertices behind the eye would invert; keep them just in front of it
        let depth = (view.perspective - position[2]).max(1.0);
        let factor = view.perspective / depth;
        vertex.position = *position;
        vertex.screen_position = [
            view.center[0] + position[0] * factor,
            view.center[1] + position[1] * factor,
        ];
        // The back is printed mirrored relative to the front
        vertex.uv = match face {
            Face::Front => uv,
            Face::Back => [1.0 - uv[0], uv[1]],
        };
    }
    (vertices, face)
}

/// Rasterizes the sleeve with the art for whichever side is visible
pub fn draw(frame: &mut FrameBuffer, transform: &SleeveTransform, view: &SleeveView) -> Face {
    let (vertices, face) = project(transform, view);
    let light = view.light_position();
    let shade: &dyn Fn([f64; 2]) -> Rgb = match face {
        Face::Front => &front_art,
        Face::Back => &back_art,
    };
    frame.draw_triangle(&vertices[0], &vertices[1], &vertices[2], &light, shade);
    frame.draw_triangle(&vertices[0], &vertices[2], &vertices[3], &light, shade);
    face
}

/// Front cover: mustard-to-rust gradient with a record sliding out
pub fn front_art(uv: [f64; 2]) -> Rgb {
    let [u, v] = uv;
    if !(0.03..=0.97).contains(&u) || !(0.03..=0.97).contains(&v) {
        return Rgb::new(40, 30, 25);
    }
    if (0.08..=0.58).contains(&u) && (0.08..=0.15).contains(&v) {
        return Rgb::new(30, 30, 30);
    }

    let dx = u - 0.62;
    let dy = v - 0.5;
    let d = (dx * dx + dy * dy).sqrt();
    if d < 0.02 {
        return Rgb::new(200, 200, 200);
    }
    if d < 0.1 {
        return Rgb::new(240, 230, 200);
    }
    if d < 0.32 {
        return if ((d * 60.0) as u32) % 2 == 0 {
            Rgb::new(22, 22, 24)
        } else {
            Rgb::new(36, 36, 40)
        };
    }

    Rgb::new(232, 176, 72).blend(Rgb::new(196, 86, 52), v)
}

/// Back cover: paper with a tracklist and a barcode
pub fn back_art(uv: [f64; 2]) -> Rgb {
    let [u, v] = uv;
    let paper = Rgb::new(228, 222, 208);
    let ink = Rgb::new(90, 86, 80);
    if !(0.03..=0.97).contains(&u) || !(0.03..=0.97).contains(&v) {
        return Rgb::new(170, 160, 145);
    }

    if (0.2..0.8).contains(&v) {
        let line = ((v - 0.2) / 0.06) as usize;
        let within = (v - 0.2) % 0.06;
        let length = 0.3 + 0.07 * ((line * 7) % 5) as f64;
        if within < 0.025 && (0.12..0.12 + length).contains(&u) {
            return ink;
        }
    }

    if (0.7..0.9).contains(&u) && (0.84..0.93).contains(&v) {
        return if ((u * 180.0) as u32) % 3 == 0 { paper } else { Rgb::BLACK };
    }
    paper
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manipulation::TransitionHint;

    fn transform(pitch: f64, yaw: f64, scale: f64) -> SleeveTransform {
        SleeveTransform { pitch, yaw, scale, hint: TransitionHint::Manual }
    }

    fn view() -> SleeveView {
        SleeveView::new([50.0, 40.0], 40.0)
    }

    #[test]
    fn flat_sleeve_projects_to_centered_square() {
        let (vertices, face) = project(&transform(0.0, 0.0, 1.0), &view());
        assert_eq!(face, Face::Front);
        assert_eq!(vertices[0].screen_position, [30.0, 20.0]);
        assert_eq!(vertices[2].screen_position, [70.0, 60.0]);
        assert!(vertices.iter().all(|v| v.normal[2] > 0.99));
    }

    #[test]
    fn scale_grows_projection() {
        let (small, _) = project(&transform(0.0, 0.0, 0.6), &view());
        let (large, _) = project(&transform(0.0, 0.0, 2.5), &view());
        let width = |v: &[Vertex; 4]| v[1].screen_position[0] - v[0].screen_position[0];
        assert!((width(&small) - 24.0).abs() < 1e-9);
        assert!((width(&large) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn half_turn_shows_the_back() {
        let (_, face) = project(&transform(0.0, 180.0, 1.0), &view());
        assert_eq!(face, Face::Back);
        let (_, face) = project(&transform(0.0, 89.0, 1.0), &view());
        assert_eq!(face, Face::Front);
        let (_, face) = project(&transform(0.0, -95.0, 1.0), &view());
        assert_eq!(face, Face::Back);
    }

    #[test]
    fn positive_yaw_pushes_right_edge_away() {
        let (vertices, _) = project(&transform(0.0, 30.0, 1.0), &view());
        // corner 1 is top-right
        assert!(vertices[1].position[2] < 0.0);
        assert!(vertices[0].position[2] > 0.0);
    }

    #[test]
    fn drawing_fills_pixels_at_center() {
        let mut frame = FrameBuffer::new(100, 40);
        let face = draw(&mut frame, &transform(15.0, -25.0, 1.0), &view());
        assert_eq!(face, Face::Front);
        assert_ne!(frame.pixel(50, 40), Rgb::BLACK);
        assert_eq!(frame.pixel(0, 0), Rgb::BLACK);
    }
}
