use std::io::{self, BufRead, Write};

use foundation::LayerKind;
use orchestrator::Session;
use scene::HeadlessRenderer;

use crate::commands::{Command, HELP, parse_command};

/// Prints which objects and legends are currently shown.
pub fn write_status(session: &Session<HeadlessRenderer>, out: &mut impl Write) -> io::Result<()> {
    let config = session.config();
    let layers: Vec<&str> = config.enabled_layers().map(LayerKind::key).collect();
    writeln!(out, "selected: {}", config.selected_option)?;
    writeln!(out, "layers: {}", layers.join(", "))?;
    let renderer = session.renderer();
    for target in renderer.visible_objects() {
        let legend = if renderer.is_legend_displayed(target) {
            " (legend)"
        } else {
            ""
        };
        writeln!(out, "visible: {target}{legend}")?;
    }
    Ok(())
}

/// Reads commands until `quit` or end of input. Layers in `ignored` were
/// removed by the query and cannot be toggled back on.
pub fn run_repl(
    session: &mut Session<HeadlessRenderer>,
    ignored: &[LayerKind],
    input: impl BufRead,
    mut out: impl Write,
) -> io::Result<()> {
    writeln!(out, "{HELP}")?;
    for line in input.lines() {
        let line = line?;
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(crate::commands::CommandError::Empty) => continue,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        let mut config = session.config().clone();
        match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Status => {
                write_status(session, &mut out)?;
                continue;
            }
            Command::Up | Command::Down => {
                let steps = if command == Command::Up { 1 } else { -1 };
                let moved = session.nudge(steps);
                writeln!(out, "moved {moved} objects")?;
                continue;
            }
            Command::Select(name) => {
                if session.dataset(&name).is_none() {
                    writeln!(out, "unknown option `{name}`")?;
                    continue;
                }
                config.select(name);
            }
            Command::Show(layer) if ignored.contains(&layer) => {
                writeln!(out, "{layer} was excluded by the query")?;
                continue;
            }
            Command::Show(layer) => config.set_layer(layer, true),
            Command::Hide(layer) => config.set_layer(layer, false),
        }
        let flips = session.on_config_changed(config);
        writeln!(out, "{flips} changes")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::run_repl;
    use foundation::LayerKind;
    use formats::{OptionSpec, OptionsManifest};
    use orchestrator::Session;
    use scene::{HeadlessRenderer, LayerRef, VisibilityConfig};
    use streaming::{LoaderConfig, MemorySource, build_loader};

    fn session() -> Session<HeadlessRenderer> {
        let source = MemorySource::new()
            .with("1.csv", b"319189,6396991,50\n".to_vec())
            .with("2.csv", b"319189,6396991,60\n".to_vec());
        let manifest = OptionsManifest {
            city_model_path: None,
            default_option: None,
            options: vec![
                OptionSpec {
                    noise_path: Some("1.csv".into()),
                    ..OptionSpec::new("Option 1")
                },
                OptionSpec {
                    noise_path: Some("2.csv".into()),
                    ..OptionSpec::new("Option 2")
                },
            ],
        };
        let loader = build_loader(LoaderConfig::default(), Arc::new(source)).unwrap();
        let mut session = Session::new(
            &manifest,
            None,
            loader,
            HeadlessRenderer::new(),
            VisibilityConfig::new("Option 1"),
        );
        session.run().unwrap();
        session
    }

    #[test]
    fn select_and_toggle() {
        let mut session = session();
        let mut out = Vec::new();
        let input = "select 2\nhide noise\nshow noise\nselect 9\nquit\nselect 1\n";
        run_repl(&mut session, &[], input.as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("2 changes"));
        assert!(text.contains("unknown option `Option 9`"));
        // Input after `quit` is not processed.
        assert_eq!(session.config().selected_option, "Option 2");
        assert!(session.renderer().is_object_visible(&LayerRef::new("Option 2", LayerKind::Noise)));
    }

    #[test]
    fn ignored_layers_stay_off() {
        let mut session = session();
        let mut out = Vec::new();
        run_repl(&mut session, &[LayerKind::Wind], "show wind\nstatus\n".as_bytes(), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("wind was excluded by the query"));
        assert!(text.contains("visible: Option 1:noise (legend)"));
    }
}
