//! Output rendering and formatting

use bankr_engine::{
    AllocationGraph, DetectionResult, EdgeKind, NeedMatrix, Resolution, ResourceRequest,
    StepReport, StepStatus, SystemState,
};
use bankr_types::ColorChoice;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use std::io;

use crate::report::{CommandOutput, SimulationReport, StepLog};

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render command output
    pub fn render(&self, output: &CommandOutput) -> io::Result<()> {
        if self.json_output {
            Self::render_json(output)
        } else {
            self.render_table(output)
        }
    }

    /// Render as a single JSON line
    fn render_json(output: &CommandOutput) -> io::Result<()> {
        let json = output.to_json().map_err(io::Error::other)?;
        println!("{json}");
        Ok(())
    }

    /// Render as formatted tables
    fn render_table(&self, output: &CommandOutput) -> io::Result<()> {
        match output {
            CommandOutput::State { state, need } => {
                Self::render_state(state, need);
                Ok(())
            }
            CommandOutput::Detection(result) => {
                self.render_detection(result);
                Ok(())
            }
            CommandOutput::Graph(graph) => {
                self.render_graph(graph);
                Ok(())
            }
            CommandOutput::Resolution(resolution) => {
                self.render_resolution(resolution);
                Ok(())
            }
            CommandOutput::Resolutions(resolutions) => {
                self.render_resolutions(resolutions);
                Ok(())
            }
            CommandOutput::Unresolved(message) => {
                println!("{}", self.style_warning(message));
                Ok(())
            }
            CommandOutput::Simulation { request, report } => {
                self.render_simulation(request.as_ref(), report);
                Ok(())
            }
            CommandOutput::Steps(log) => {
                self.render_step_log(log);
                Ok(())
            }
            CommandOutput::Step(report) => self.render_single_step(report),
        }
    }

    /// Render the snapshot matrices
    fn render_state(state: &SystemState, need: &NeedMatrix) {
        println!(
            "{} processes, {} resource types",
            state.num_processes(),
            state.num_resources()
        );
        println!("Available: {}", format_units(&state.available));
        println!();

        let mut table = new_table();
        table.set_header(vec![
            header_cell("Process"),
            header_cell("Allocation"),
            header_cell("Max need"),
            header_cell("Need"),
        ]);
        for (p, need_row) in need.iter().enumerate() {
            table.add_row(vec![
                Cell::new(format!("P{p}")),
                Cell::new(format_units(&state.allocation[p])),
                Cell::new(format_units(&state.max_need[p])),
                Cell::new(format_units(need_row)),
            ]);
        }
        println!("{table}");
    }

    /// Render a safety verdict
    fn render_detection(&self, result: &DetectionResult) {
        if result.is_safe() {
            println!("{}", self.style_ok("SAFE: no deadlock"));
        } else {
            println!("{}", self.style_error("DEADLOCK detected"));
        }
        println!("Safe sequence: {}", format_sequence(&result.safe_sequence));
        if result.is_deadlocked {
            println!(
                "Deadlocked:    {}",
                format_process_list(&result.deadlocked_processes)
            );
        }
    }

    /// Render the allocation graph edge list
    fn render_graph(&self, graph: &AllocationGraph) {
        println!(
            "{} nodes ({} processes, {} resources)",
            graph.node_count(),
            graph.num_processes(),
            graph.num_resources()
        );

        if graph.edges().is_empty() {
            println!("No edges.");
        } else {
            let mut table = new_table();
            table.set_header(vec![
                header_cell("From"),
                header_cell("To"),
                header_cell("Type"),
            ]);
            for edge in graph.edges() {
                let label = |id| graph.node(id).map_or_else(|| id.to_string(), |n| n.label());
                let kind_cell = match edge.kind {
                    EdgeKind::Request => Cell::new("request").fg(Color::Yellow),
                    EdgeKind::Assignment => Cell::new("assignment").fg(Color::Cyan),
                };
                table.add_row(vec![
                    Cell::new(label(edge.from)),
                    Cell::new(label(edge.to)),
                    kind_cell,
                ]);
            }
            println!("{table}");
        }

        println!(
            "{} request edges, {} assignment edges",
            graph.count(EdgeKind::Request),
            graph.count(EdgeKind::Assignment)
        );
        if graph.has_cycle() {
            println!("{}", self.style_error("Cycle found"));
        } else {
            println!("{}", self.style_ok("No cycle"));
        }
    }

    /// Render one termination and the verdict that follows it
    fn render_resolution(&self, resolution: &Resolution) {
        println!(
            "Terminated {}, released {}",
            self.style_bold(&format!("P{}", resolution.victim)),
            format_units(&resolution.released)
        );
        println!(
            "Available now: {}",
            format_units(&resolution.state.available)
        );
        self.render_detection(&resolution.result);
    }

    fn render_resolutions(&self, resolutions: &[Resolution]) {
        if resolutions.is_empty() {
            println!("{}", self.style_ok("State is already safe; nothing to resolve."));
            return;
        }
        for (round, resolution) in resolutions.iter().enumerate() {
            if round > 0 {
                println!();
            }
            println!("Round {}", round + 1);
            self.render_resolution(resolution);
        }
    }

    fn render_simulation(&self, request: Option<&ResourceRequest>, report: &SimulationReport) {
        if let Some(request) = request {
            println!(
                "Request: P{} asks for {} of R{}",
                request.process, request.amount, request.resource
            );
        }
        if report.granted {
            println!("{} {}", self.style_ok("GRANTED"), report.message);
        } else {
            println!("{} {}", self.style_error("DENIED"), report.message);
        }
    }

    /// Render a complete step-by-step run
    fn render_step_log(&self, log: &StepLog) {
        let mut table = new_table();
        table.set_header(vec![
            header_cell("Step"),
            header_cell("Process"),
            header_cell("Need"),
            header_cell("Work before"),
            header_cell("Work after"),
        ]);
        let mut found = 0;
        for status in &log.steps {
            if let StepStatus::Found {
                process,
                need,
                work_before,
                work_after,
            } = status
            {
                found += 1;
                table.add_row(vec![
                    Cell::new(found),
                    Cell::new(format!("P{process}")),
                    Cell::new(format_units(need)),
                    Cell::new(format_units(work_before)),
                    Cell::new(format_units(work_after)),
                ]);
            }
        }
        if found > 0 {
            println!("{table}");
        }

        if log.result.is_deadlocked {
            println!(
                "{} remaining processes {} cannot proceed",
                self.style_error("DEADLOCK:"),
                format_process_list(&log.result.deadlocked_processes)
            );
        } else {
            println!(
                "{} {}",
                self.style_ok("Done. Safe sequence:"),
                format_sequence(&log.result.safe_sequence)
            );
        }
    }

    /// Render one step plus the state needed to resume
    fn render_single_step(&self, report: &StepReport) -> io::Result<()> {
        match &report.status {
            StepStatus::Found {
                process,
                need,
                work_before,
                work_after,
            } => println!(
                "P{process} can finish: need {} <= work {}, work becomes {}",
                format_units(need),
                format_units(work_before),
                format_units(work_after)
            ),
            StepStatus::Done => println!(
                "{} {}",
                self.style_ok("Done. Safe sequence:"),
                format_sequence(&report.step_state.safe_sequence)
            ),
            StepStatus::Deadlock { deadlocked } => println!(
                "{} {}",
                self.style_error("DEADLOCK:"),
                format_process_list(deadlocked)
            ),
        }
        if !report.status.is_terminal() {
            let resume = serde_json::to_string(&report.step_state).map_err(io::Error::other)?;
            println!("Resume state: {resume}");
        }
        Ok(())
    }

    fn style_ok(&self, text: &str) -> String {
        self.styled(text, Style::new().green().bold())
    }

    fn style_error(&self, text: &str) -> String {
        self.styled(text, Style::new().red().bold())
    }

    fn style_warning(&self, text: &str) -> String {
        self.styled(text, Style::new().yellow())
    }

    fn style_bold(&self, text: &str) -> String {
        self.styled(text, Style::new().bold())
    }

    fn styled(&self, text: &str, style: Style) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(title: &str) -> Cell {
    Cell::new(title).add_attribute(Attribute::Bold)
}

/// `[3 3 2]`
fn format_units<T: ToString>(units: &[T]) -> String {
    let inner: Vec<String> = units.iter().map(ToString::to_string).collect();
    format!("[{}]", inner.join(" "))
}

/// `P1 -> P3 -> P4`, or `(none)`
fn format_sequence(sequence: &[usize]) -> String {
    if sequence.is_empty() {
        return "(none)".to_string();
    }
    sequence
        .iter()
        .map(|p| format!("P{p}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_process_list(processes: &[usize]) -> String {
    processes
        .iter()
        .map(|p| format!("P{p}"))
        .collect::<Vec<_>>()
        .join(", ")
}
