use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;

use anyhow::{Error, Result};
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::TaskKey;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Done,
    Pending,
    InProgress,
    Disabled,
    Skipped,
    Failed,
}

/// Terminal spinners tracking the tasks of a plan in order.
pub struct StepContext {
    step_num: usize,
    steps: Vec<Step>,
}

pub struct Step {
    desc: String,
    key: TaskKey,
    status: StepStatus,
    progress_bar: ProgressBar,
    disabled: bool,
}

impl Step {
    fn new(desc: &str, key: TaskKey, disabled: bool) -> Self {
        Self {
            desc: desc.to_string(),
            key,
            status: StepStatus::Pending,
            progress_bar: ProgressBar::new_spinner(),
            disabled,
        }
    }
}

impl StepContext {
    pub fn new(tasks: &HashSet<TaskKey>) -> Self {
        println!("Tasks:");

        let mut steps = vec![
            Step::new("Generate plan", TaskKey::GeneratePlan, false),
            Step::new("Generate netlist", TaskKey::GenerateNetlist, false),
            Step::new(
                "Run simulation",
                TaskKey::RunSimulation,
                !tasks.contains(&TaskKey::RunSimulation),
            ),
            Step::new(
                "Harvest results",
                TaskKey::HarvestResults,
                !tasks.contains(&TaskKey::HarvestResults),
            ),
        ];
        let mp = MultiProgress::new();
        let num_steps = steps.iter().filter(|step| !step.disabled).count();
        let mut counter = 0;
        let width = format!("{num_steps}").len();
        for (i, step) in steps.iter_mut().enumerate() {
            mp.insert(i + 1, step.progress_bar.clone());
            if step.disabled {
                let msg = Some(format!("[-/-] {}", step.desc));
                step.set_status(StepStatus::Disabled, msg);
            } else {
                counter += 1;
                let msg = Some(format!("[{counter:width$}/{num_steps:width$}] {}", step.desc));
                step.set_status(StepStatus::Pending, msg);
            }
        }
        if let Some(first) = steps.first() {
            first
                .progress_bar
                .enable_steady_tick(Duration::from_millis(200));
        }
        StepContext { step_num: 0, steps }
    }

    pub fn advance(&mut self) {
        self.step_num += 1;
        while let Some(current_step) = self.current_step() {
            if !current_step.disabled {
                break;
            }
            self.step_num += 1;
        }
    }

    #[inline]
    pub fn current_step(&mut self) -> Option<&mut Step> {
        self.steps.get_mut(self.step_num)
    }

    pub fn status(&self, key: TaskKey) -> Option<StepStatus> {
        self.steps.iter().find(|s| s.key == key).map(|s| s.status)
    }

    /// Marks the current step failed and the rest skipped when `res` is an error.
    pub fn check<T>(&mut self, res: Result<T>) -> Result<T> {
        if res.is_err() {
            if let Some(current_step) = self.current_step() {
                current_step.set_status(StepStatus::Failed, None);
                self.advance();
                while let Some(current_step) = self.current_step() {
                    current_step.set_status(StepStatus::Skipped, None);
                    self.advance();
                }
            }
            println!("\n");
        }

        res
    }

    pub fn bail(&mut self, e: Error) -> Result<()> {
        self.check(Err(e))
    }

    pub fn finish(&mut self, key: TaskKey) {
        let Some(current_step) = self.current_step() else {
            log::warn!("step {key:?} finished after all steps completed");
            return;
        };
        if current_step.key != key {
            log::warn!("step {key:?} finished while {:?} was in progress", current_step.key);
            return;
        }

        current_step.set_status(StepStatus::Done, None);
        self.advance();

        if let Some(current_step) = self.current_step() {
            current_step.set_status(StepStatus::InProgress, None);
        } else {
            self.done();
        }
    }

    pub fn done(&mut self) {
        println!("\n\nCompleted all tasks");
    }
}

fn format_template(spinner: bool, status: impl Display) -> String {
    if spinner {
        format!("{{spinner:.green}} {status:16} {{msg}}")
    } else {
        format!("  {status:16} {{msg}}")
    }
}

impl Step {
    fn set_status(&mut self, status: StepStatus, msg: Option<String>) {
        let status_template = match status {
            StepStatus::Disabled => {
                format_template(false, "Disabled".truecolor(120, 120, 120).bold())
            }
            StepStatus::Done => format_template(false, "Done".green().bold()),
            StepStatus::Failed => format_template(false, "Failed".bright_white().on_red().bold()),
            StepStatus::InProgress => format_template(true, "In Progress".bright_white().bold()),
            StepStatus::Pending => format_template(true, "Pending".blue().bold()),
            StepStatus::Skipped => format_template(false, "Skipped".yellow().bold()),
        };
        self.status = status;
        match ProgressStyle::with_template(&status_template) {
            Ok(style) => self.progress_bar.set_style(style),
            Err(e) => log::warn!("invalid progress template: {e}"),
        }

        if let Some(msg) = msg {
            self.progress_bar.set_message(msg);
        }

        if status == StepStatus::InProgress {
            self.progress_bar
                .enable_steady_tick(Duration::from_millis(200));
        } else if status != StepStatus::Pending {
            self.progress_bar.finish();
        }
    }
}
