use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use sukashi::{
    Config,
    exif,
    export::{ExportSpec, NamingRule, OutputFormat, formats, run_batch},
    fonts::FontResolver,
    position::{Anchor, Position},
    scanner,
    templates::{Template, TemplateStore},
    watermark::{ResizeSpec, StyleSpec, WatermarkKind, WatermarkSource, composite},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "sukashi.toml", global = true)]
    config: PathBuf,

    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark a batch of images into an output directory
    Apply {
        /// Image files or directories to import (directories are walked
        /// recursively; unsupported files are skipped)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(short, long)]
        output_dir: PathBuf,

        /// Start from a saved template instead of the defaults
        #[arg(short, long)]
        template: Option<String>,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        export: ExportArgs,

        #[command(flatten)]
        resize: ResizeArgs,
    },

    /// Composite a single image and report the placed watermark bounds
    Preview {
        image: PathBuf,

        /// Where to write the composited preview
        #[arg(short, long)]
        out: PathBuf,

        #[arg(short, long)]
        template: Option<String>,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        export: ExportArgs,
    },

    /// Manage saved templates
    #[command(subcommand)]
    Template(TemplateCommands),

    /// List fonts discovered on this system
    Fonts {
        #[arg(long, default_value_t = 300)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateCommands {
    /// List all saved templates
    List,
    /// Print a template as JSON
    Show { name: String },
    /// Save the given style/export settings under a name
    Save {
        name: String,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,

        #[command(flatten)]
        export: ExportArgs,

        #[command(flatten)]
        resize: ResizeArgs,
    },
    /// Delete a saved template
    Delete { name: String },
}

#[derive(Args, Debug)]
struct StyleArgs {
    /// Watermark text; leave unset to use each image's EXIF/mtime date
    #[arg(long)]
    text: Option<String>,

    #[arg(long)]
    font_size: Option<u32>,

    /// Font file path or a name from `sukashi fonts`
    #[arg(long)]
    font: Option<String>,

    /// Text color: #RRGGBB, #RGB, or a basic color name
    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    opacity: Option<f32>,

    /// One of the nine grid anchors, e.g. bottom-right
    #[arg(long, value_parser = parse_anchor, conflicts_with = "custom_pos")]
    position: Option<Anchor>,

    /// Custom placement as span fractions, e.g. 0.8,0.25
    #[arg(long, value_parser = parse_fractions)]
    custom_pos: Option<(f64, f64)>,

    /// Rotation in degrees (counter-clockwise)
    #[arg(long)]
    rotation: Option<i32>,

    /// Draw the background box behind the text (true/false)
    #[arg(long)]
    boxed: Option<bool>,

    #[arg(long)]
    box_padding: Option<u32>,

    #[arg(long, conflicts_with = "no_stroke")]
    stroke_width: Option<u32>,

    #[arg(long, conflicts_with = "no_stroke")]
    stroke_color: Option<String>,

    /// Remove any stroke inherited from a template
    #[arg(long)]
    no_stroke: bool,

    #[arg(long, conflicts_with = "no_shadow")]
    shadow_dx: Option<i32>,

    #[arg(long, conflicts_with = "no_shadow")]
    shadow_dy: Option<i32>,

    #[arg(long, conflicts_with = "no_shadow")]
    shadow_color: Option<String>,

    /// Remove any shadow inherited from a template
    #[arg(long)]
    no_shadow: bool,

    /// Use this image as the watermark instead of text
    #[arg(long)]
    watermark_image: Option<PathBuf>,

    /// Image watermark scale in percent
    #[arg(long)]
    image_scale: Option<u32>,

    #[arg(long)]
    image_opacity: Option<f32>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Output format: jpeg or png
    #[arg(long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// JPEG quality
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Prepend this to every output filename
    #[arg(long, conflicts_with = "suffix")]
    prefix: Option<String>,

    /// Append this to every output filename stem
    #[arg(long)]
    suffix: Option<String>,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct ResizeArgs {
    /// Resize the base image to this width before watermarking
    #[arg(long)]
    resize_width: Option<u32>,

    #[arg(long)]
    resize_height: Option<u32>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=500))]
    resize_percent: Option<u32>,
}

fn parse_anchor(s: &str) -> Result<Anchor, String> {
    match s {
        "top-left" => Ok(Anchor::TopLeft),
        "top-center" => Ok(Anchor::TopCenter),
        "top-right" => Ok(Anchor::TopRight),
        "center-left" => Ok(Anchor::CenterLeft),
        "center" => Ok(Anchor::Center),
        "center-right" => Ok(Anchor::CenterRight),
        "bottom-left" => Ok(Anchor::BottomLeft),
        "bottom-center" => Ok(Anchor::BottomCenter),
        "bottom-right" => Ok(Anchor::BottomRight),
        other => Err(format!("unknown anchor {other:?}")),
    }
}

fn parse_fractions(s: &str) -> Result<(f64, f64), String> {
    let (fx, fy) = s
        .split_once(',')
        .ok_or_else(|| "expected fx,fy".to_string())?;
    let fx = fx.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let fy = fy.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((fx, fy))
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    match s.to_ascii_lowercase().as_str() {
        "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
        "png" => Ok(OutputFormat::Png),
        other => Err(format!("unknown format {other:?} (expected jpeg or png)")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Set up logging first
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = if cli.config.exists() {
        let config_content = std::fs::read_to_string(&cli.config)?;
        toml_edit::de::from_str::<Config>(&config_content)?
    } else {
        info!("Config file not found at {:?}, using defaults", cli.config);
        Config::default()
    };

    match cli.command {
        Commands::Apply {
            inputs,
            output_dir,
            template,
            style,
            export,
            resize,
        } => run_apply(&config, inputs, output_dir, template, style, export, resize),
        Commands::Preview {
            image,
            out,
            template,
            style,
            export,
        } => run_preview(&config, image, out, template, style, export),
        Commands::Template(cmd) => handle_template_command(&config, cmd),
        Commands::Fonts { limit } => {
            let mut resolver = FontResolver::new();
            let fonts = resolver.list_system_fonts(limit);
            if fonts.is_empty() {
                println!("No fonts found in the system font directories");
            } else {
                for (name, path) in fonts {
                    println!("{}  {}", name, path.display());
                }
            }
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_apply(
    config: &Config,
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    template_name: Option<String>,
    style_args: StyleArgs,
    export_args: ExportArgs,
    resize_args: ResizeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = TemplateStore::new(config.template_directory());
    let mut template = load_base_template(&store, template_name.as_deref());
    apply_style_overrides(&mut template.style, config, &style_args);
    apply_export_overrides(&mut template.export, &export_args);
    apply_resize_overrides(&mut template.resize, &resize_args);
    template.export.output_dir = output_dir;

    let mut sources = Vec::new();
    for input in &inputs {
        for image in scanner::find_images(input) {
            if !sources.contains(&image) {
                sources.push(image);
            }
        }
    }
    if sources.is_empty() {
        eprintln!("Error: no importable images found in the given inputs");
        std::process::exit(1);
    }
    info!("imported {} image(s)", sources.len());

    let mut resolver = FontResolver::new();
    normalize_legacy_template(&mut template, &sources[0], &mut resolver);

    match run_batch(
        &sources,
        &template.style,
        &template.resize,
        &template.export,
        &mut resolver,
    ) {
        Ok(report) => {
            store.save_last(&template);
            println!("{}", report.summary());
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn run_preview(
    config: &Config,
    image: PathBuf,
    out: PathBuf,
    template_name: Option<String>,
    style_args: StyleArgs,
    export_args: ExportArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = TemplateStore::new(config.template_directory());
    let mut template = load_base_template(&store, template_name.as_deref());
    apply_style_overrides(&mut template.style, config, &style_args);
    apply_export_overrides(&mut template.export, &export_args);

    let mut resolver = FontResolver::new();
    normalize_legacy_template(&mut template, &image, &mut resolver);

    let mut style = template.style.clone();
    if style.kind == WatermarkKind::Text && style.text.trim().is_empty() {
        match exif::derive_date_text(&image) {
            Some(date) => style.text = date,
            None => {
                eprintln!(
                    "Error: no EXIF date or mtime available for {}",
                    image.display()
                );
                std::process::exit(1);
            }
        }
    }

    let result = match composite(
        WatermarkSource::Path(image.clone()),
        &style,
        &ResizeSpec::None,
        &mut resolver,
    ) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let b = result.bounds;
    println!(
        "watermark bounds: {}x{} at ({}, {})",
        b.width, b.height, b.x, b.y
    );

    let format = export_args.format.unwrap_or_else(|| preview_format(&out));
    let image_out = image::DynamicImage::ImageRgba8(result.image);
    match format {
        OutputFormat::Jpeg => formats::jpeg::save(&image_out, &out, template.export.jpeg_quality)?,
        OutputFormat::Png => formats::png::save(&image_out, &out)?,
    }
    println!("preview written to {}", out.display());
    Ok(())
}

/// Infer the preview output format from the target extension.
fn preview_format(out: &Path) -> OutputFormat {
    match out.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => {
            OutputFormat::Jpeg
        }
        _ => OutputFormat::Png,
    }
}

fn handle_template_command(
    config: &Config,
    cmd: TemplateCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = TemplateStore::new(config.template_directory());

    match cmd {
        TemplateCommands::List => {
            let names = store.list();
            if names.is_empty() {
                println!("No templates saved in {}", store.directory().display());
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        TemplateCommands::Show { name } => match store.load(&name) {
            Ok(template) => println!("{}", serde_json::to_string_pretty(&template)?),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        TemplateCommands::Save {
            name,
            output_dir,
            style,
            export,
            resize,
        } => {
            let mut template = Template::default();
            apply_style_overrides(&mut template.style, config, &style);
            apply_export_overrides(&mut template.export, &export);
            apply_resize_overrides(&mut template.resize, &resize);
            if let Some(dir) = output_dir {
                template.export.output_dir = dir;
            }
            store.save(&name, &template)?;
            println!("Saved template {name:?} to {}", store.directory().display());
        }
        TemplateCommands::Delete { name } => match store.delete(&name) {
            Ok(()) => println!("Deleted template {name:?}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn load_base_template(store: &TemplateStore, name: Option<&str>) -> Template {
    match name {
        Some(name) => match store.load(name) {
            Ok(template) => template,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => Template::default(),
    }
}

fn apply_style_overrides(style: &mut StyleSpec, config: &Config, args: &StyleArgs) {
    if style.font_family.is_none() {
        style.font_family = config.fonts.default_family.clone();
    }

    if let Some(text) = &args.text {
        style.text = text.clone();
    }
    if let Some(size) = args.font_size {
        style.font_size = size;
    }
    if let Some(font) = &args.font {
        style.font_family = Some(font.clone());
    }
    if let Some(color) = &args.color {
        style.color = color.clone();
    }
    if let Some(opacity) = args.opacity {
        style.opacity = opacity;
    }
    if let Some(anchor) = args.position {
        style.position = Position::Anchor(anchor);
    }
    if let Some((fx, fy)) = args.custom_pos {
        style.position = Position::Custom { fx, fy };
    }
    if let Some(rotation) = args.rotation {
        style.rotation = rotation;
    }
    if let Some(boxed) = args.boxed {
        style.boxed = boxed;
    }
    if let Some(padding) = args.box_padding {
        style.box_padding = padding;
    }

    if args.no_stroke {
        style.stroke = None;
    } else if args.stroke_width.is_some() || args.stroke_color.is_some() {
        let mut stroke = style.stroke.clone().unwrap_or_default();
        if let Some(width) = args.stroke_width {
            stroke.width = width;
        }
        if let Some(color) = &args.stroke_color {
            stroke.color = color.clone();
        }
        style.stroke = Some(stroke);
    }

    if args.no_shadow {
        style.shadow = None;
    } else if args.shadow_dx.is_some() || args.shadow_dy.is_some() || args.shadow_color.is_some() {
        let mut shadow = style.shadow.clone().unwrap_or_default();
        if let Some(dx) = args.shadow_dx {
            shadow.dx = dx;
        }
        if let Some(dy) = args.shadow_dy {
            shadow.dy = dy;
        }
        if let Some(color) = &args.shadow_color {
            shadow.color = color.clone();
        }
        style.shadow = Some(shadow);
    }

    if let Some(path) = &args.watermark_image {
        style.kind = WatermarkKind::Image;
        style.image_path = Some(path.clone());
    }
    if let Some(scale) = args.image_scale {
        style.image_scale = scale;
    }
    if let Some(opacity) = args.image_opacity {
        style.image_opacity = opacity;
    }
}

fn apply_export_overrides(export: &mut ExportSpec, args: &ExportArgs) {
    if let Some(format) = args.format {
        export.format = format;
    }
    if let Some(quality) = args.quality {
        export.jpeg_quality = quality;
    }
    if let Some(prefix) = &args.prefix {
        export.naming = NamingRule::Prefix(prefix.clone());
    }
    if let Some(suffix) = &args.suffix {
        export.naming = NamingRule::Suffix(suffix.clone());
    }
}

fn apply_resize_overrides(resize: &mut ResizeSpec, args: &ResizeArgs) {
    if let Some(width) = args.resize_width {
        *resize = ResizeSpec::Width(width);
    }
    if let Some(height) = args.resize_height {
        *resize = ResizeSpec::Height(height);
    }
    if let Some(percent) = args.resize_percent {
        *resize = ResizeSpec::Percent(percent);
    }
}

/// Convert a legacy template's image-relative custom position to the span
/// form, measuring the watermark against the first image of the run. Left
/// untouched when measurement is impossible; the compositor's clamp keeps
/// even unconverted fractions inside the image.
fn normalize_legacy_template(
    template: &mut Template,
    reference: &Path,
    resolver: &mut FontResolver,
) {
    if template.custom_pos_span || !matches!(template.style.position, Position::Custom { .. }) {
        return;
    }
    let Ok(dimensions) = image::image_dimensions(reference) else {
        return;
    };

    // Probe composite at center to learn the rotated watermark size on this
    // image, the same way the original conversion measured it.
    let mut probe = template.style.clone();
    probe.position = Position::Anchor(Anchor::Center);
    if probe.kind == WatermarkKind::Text && probe.text.trim().is_empty() {
        match exif::derive_date_text(reference) {
            Some(date) => probe.text = date,
            None => return,
        }
    }

    if let Ok(result) = composite(
        WatermarkSource::Path(reference.to_path_buf()),
        &probe,
        &ResizeSpec::None,
        resolver,
    ) {
        template.normalize_custom_position(dimensions, (result.bounds.width, result.bounds.height));
        info!("converted legacy custom position to span form");
    }
}
