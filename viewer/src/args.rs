use clap::{Parser, ValueEnum};

use gl_scene::SceneKind;

const WORLD_IMAGERY_URL: &str = "https://services.arcgisonline.com/arcgis/rest/services/World_Imagery/MapServer/WMTS?tilematrix=0&layer=World_Imagery&style=default&tilerow=0&tilecol=0&tilematrixset=1&format=image%2Fjpeg&service=WMTS&version=1.0.0&request=GetTile";

#[derive(Debug, Parser)]
pub struct Args {
    /// Scene to render
    #[arg(value_enum, default_value_t = SceneArg::Cube)]
    pub scene: SceneArg,
    /// Image mapped onto the cube; the flat scene ignores it
    #[arg(short, long, default_value = WORLD_IMAGERY_URL)]
    pub texture_url: String,
    /// Initial window width
    #[arg(long, default_value_t = 640)]
    pub width: u32,
    /// Initial window height
    #[arg(long, default_value_t = 480)]
    pub height: u32,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum SceneArg {
    Flat,
    Cube,
}

impl From<SceneArg> for SceneKind {
    fn from(s: SceneArg) -> Self {
        match s {
            SceneArg::Flat => Self::Flat,
            SceneArg::Cube => Self::Cube,
        }
    }
}
