//! Procedural exam-image rendering. Nothing is read from disk: the
//! drawing is derived entirely from `(tipo, id)` so the same request
//! always yields the same bytes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

/// Render a synthetic exam image for the given type, seeded by `id`.
pub fn render(tipo: &str, id: &str) -> String {
    let seed = seed_for(tipo, id);
    let body = match tipo {
        "ecg" | "electrocardiograma" => ecg_trace(seed),
        "radiografia" | "rx" => radiograph(seed),
        _ => placeholder(tipo, seed),
    };
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" \
         viewBox=\"0 0 {WIDTH} {HEIGHT}\">{body}</svg>"
    )
}

fn seed_for(tipo: &str, id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    tipo.hash(&mut hasher);
    id.hash(&mut hasher);
    hasher.finish()
}

/// Grid paper with a spiky trace whose rate and amplitude vary per seed.
fn ecg_trace(seed: u64) -> String {
    let beats = 4 + (seed % 5) as i64;
    let amplitude = 40 + (seed >> 8) as i64 % 50;
    let baseline = (HEIGHT / 2) as i64;
    let step = WIDTH as i64 / (beats * 8);

    let mut points = String::new();
    let mut x = 0i64;
    for _ in 0..beats {
        for (dx, dy) in [
            (2, 0),
            (1, -amplitude / 6),
            (1, amplitude / 6),
            (1, -amplitude),
            (1, amplitude + amplitude / 4),
            (1, -amplitude / 4),
            (1, 0),
        ] {
            x += dx * step;
            let y = baseline + dy;
            points.push_str(&format!("{x},{y} "));
        }
    }

    format!(
        "<rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"#fdf3f3\"/>\
         <g stroke=\"#f0c5c5\" stroke-width=\"1\">{}</g>\
         <polyline points=\"{}\" fill=\"none\" stroke=\"#b21f1f\" stroke-width=\"2\"/>",
        grid_lines(),
        points.trim_end()
    )
}

/// Dark field with lighter lung-shaped ellipses; offsets vary per seed.
fn radiograph(seed: u64) -> String {
    let shift = (seed % 30) as i64 - 15;
    let cy = (HEIGHT / 2) as i64 + shift;
    format!(
        "<rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"#10151c\"/>\
         <ellipse cx=\"{lx}\" cy=\"{cy}\" rx=\"110\" ry=\"170\" fill=\"#2b3a4a\"/>\
         <ellipse cx=\"{rx}\" cy=\"{cy}\" rx=\"110\" ry=\"170\" fill=\"#2b3a4a\"/>\
         <rect x=\"{mid}\" y=\"60\" width=\"24\" height=\"360\" fill=\"#45586c\"/>",
        lx = WIDTH as i64 / 2 - 140,
        rx = WIDTH as i64 / 2 + 140,
        mid = WIDTH / 2 - 12,
    )
}

fn placeholder(tipo: &str, seed: u64) -> String {
    let hue = seed % 360;
    format!(
        "<rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"hsl({hue}, 25%, 88%)\"/>\
         <text x=\"{cx}\" y=\"{cy}\" text-anchor=\"middle\" font-family=\"sans-serif\" \
         font-size=\"28\" fill=\"#444\">{tipo}</text>",
        cx = WIDTH / 2,
        cy = HEIGHT / 2,
    )
}

fn grid_lines() -> String {
    let mut lines = String::new();
    let mut x = 0;
    while x <= WIDTH {
        lines.push_str(&format!(
            "<line x1=\"{x}\" y1=\"0\" x2=\"{x}\" y2=\"{HEIGHT}\"/>"
        ));
        x += 40;
    }
    let mut y = 0;
    while y <= HEIGHT {
        lines.push_str(&format!(
            "<line x1=\"0\" y1=\"{y}\" x2=\"{WIDTH}\" y2=\"{y}\"/>"
        ));
        y += 40;
    }
    lines
}
