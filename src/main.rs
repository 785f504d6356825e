// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use log::error;
use nalgebra::Point2;
use quadtex::{Dimension, Filter, QuadSize, RecordingContext, Settings, Texture, TextureError};

const USAGE: &str = "usage: quadtex <image> [width|auto] [height|auto] [--nearest]";

#[derive(Debug, PartialEq)]
struct Cli {
    image: PathBuf,
    size: QuadSize,
    nearest: bool,
}

fn parse_dimension(arg: &str) -> Result<Dimension, String> {
    if arg.eq_ignore_ascii_case("auto") {
        return Ok(Dimension::Auto);
    }
    arg.parse::<f64>()
        .map(Dimension::Fixed)
        .map_err(|_| format!("invalid size '{}'", arg))
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut nearest = false;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--nearest" => nearest = true,
            flag if flag.starts_with("--") => return Err(format!("unknown flag '{}'", flag)),
            value => positional.push(value),
        }
    }

    let (image, rest) = positional
        .split_first()
        .ok_or_else(|| "missing image path".to_string())?;
    if rest.len() > 2 {
        return Err("too many arguments".to_string());
    }
    let width = rest.first().map_or(Ok(Dimension::Auto), |w| parse_dimension(w))?;
    let height = rest.get(1).map_or(Ok(Dimension::Auto), |h| parse_dimension(h))?;

    Ok(Cli {
        image: PathBuf::from(*image),
        size: QuadSize::new(width, height),
        nearest,
    })
}

/// Loads the image headlessly and prints the quad `render` would submit.
fn run(cli: &Cli, settings: &Settings) -> Result<(), TextureError> {
    let ctx = Rc::new(RecordingContext::new());
    let filter = if cli.nearest {
        Filter::Nearest
    } else {
        settings.textures.filter
    };
    let path = settings.resolve_asset(&cli.image);

    let texture = Texture::from_path(&ctx, &path, filter)?;
    println!(
        "{}: {}x{} aspect={:.4}",
        path.display(),
        texture.width(),
        texture.height(),
        texture.aspect_ratio()
    );

    texture.render(Point2::origin(), cli.size, settings.render.tint);
    for quad in ctx.drawn_quads() {
        println!("quad {:.2}x{:.2}", quad.width(), quad.height());
        for vertex in &quad.vertices {
            println!(
                "  uv=({}, {}) pos=({:.2}, {:.2})",
                vertex.tex_coord[0], vertex.tex_coord[1], vertex.position.x, vertex.position.y
            );
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{}\n{}", message, USAGE);
            process::exit(2);
        }
    };

    let settings = Settings::load_user_settings();
    if let Err(e) = run(&cli, &settings) {
        error!("{}", e);
        process::exit(1);
    }
}
