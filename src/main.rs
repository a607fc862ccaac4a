pub mod ui;

use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::{Duration, Instant},
};

use chordtime::{
    combo::TrialGenerator,
    config::{Config, ConfigStore, FileConfigStore},
    input::{translate, KeyAction},
    logging,
    runtime::{CrosstermEventSource, Driven, EventSource, FixedTicker, Runner, Ticker},
    scoring::ScoringRule,
    session::{Phase, Session, Transition},
    sink::{CsvSink, ResultsSink},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};

const TICK_RATE_MS: u64 = 20;

/// timed key-combination reaction experiment
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Shows a participant a combination of keys, times how quickly and accurately they hold exactly that combination, grows the combination over the run and appends summary rows to a CSV file."
)]
pub struct Cli {
    /// participant identifier written to every result row
    participant_id: String,

    /// trial/run label written to every result row
    trial_number: String,

    /// seed for the combination generator (any 64-bit integer)
    #[clap(allow_negative_numbers = true)]
    seed: Option<i64>,

    /// number of trials in the session
    #[clap(short = 'n', long)]
    trials: Option<usize>,

    /// largest combination size, reached in the last stretch of the session
    #[clap(short = 'k', long)]
    max_combo: Option<usize>,

    /// pause between trials in milliseconds
    #[clap(short = 'd', long)]
    delay_ms: Option<u64>,

    /// how long the completion message stays up in milliseconds
    #[clap(long)]
    end_delay_ms: Option<u64>,

    /// exact set match, or share of target keys held
    #[clap(long, value_enum)]
    scoring: Option<ScoringRule>,

    /// results file, rows are appended
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,

    /// config file to read defaults from
    #[clap(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(n) = self.trials {
            cfg.trial_count = n;
        }
        if let Some(k) = self.max_combo {
            cfg.max_combo_size = k;
        }
        if let Some(ms) = self.delay_ms {
            cfg.inter_trial_delay_ms = ms;
        }
        if let Some(ms) = self.end_delay_ms {
            cfg.end_delay_ms = ms;
        }
        if let Some(rule) = self.scoring {
            cfg.scoring_rule = rule;
        }
        if let Some(ref out) = self.output {
            cfg.output = out.clone();
        }
        cfg
    }

    fn config_store(&self) -> FileConfigStore {
        match self.config {
            Some(ref path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

pub struct App {
    pub participant_id: String,
    pub trial_number: String,
    pub output: PathBuf,
    pub session: Session,
    pub sink: Box<dyn ResultsSink>,
    /// terminal reports releases and bare modifiers
    pub enhanced_keys: bool,
}

impl App {
    pub fn new(cli: &Cli, config: &Config, session: Session, sink: Box<dyn ResultsSink>) -> Self {
        Self {
            participant_id: cli.participant_id.clone(),
            trial_number: cli.trial_number.clone(),
            output: config.output.clone(),
            session,
            sink,
            enhanced_keys: false,
        }
    }

    /// Returns true when the screen needs redrawing
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> Result<bool, Box<dyn Error>> {
        if key.code == KeyCode::Esc {
            if key.kind == KeyEventKind::Press {
                self.session.abort();
            }
            return Ok(true);
        }

        if self.session.phase() == &Phase::Idle {
            let start = key.kind == KeyEventKind::Press
                && matches!(key.code, KeyCode::Enter | KeyCode::Char(' '));
            if start {
                self.session.start(now)?;
            }
            return Ok(start);
        }

        let mut redraw = false;
        for action in translate(&key, self.enhanced_keys) {
            let transition = match action {
                KeyAction::Press(sym) => self.session.on_press(&sym, now)?,
                KeyAction::Release(sym) => self.session.on_release(&sym),
            };
            redraw |= self.apply(transition)?;
        }
        Ok(redraw)
    }

    pub fn on_tick(&mut self, now: Instant) -> Result<bool, Box<dyn Error>> {
        let transition = self.session.tick(now)?;
        self.apply(transition)
    }

    fn apply(&mut self, transition: Transition) -> Result<bool, Box<dyn Error>> {
        match transition {
            Transition::None => Ok(false),
            Transition::SessionComplete { report, .. } => {
                let rows = report.rows(&self.participant_id, &self.trial_number);
                self.sink.write_rows(&rows)?;
                info!(
                    "wrote {} rows for participant {} run {}",
                    rows.len(),
                    self.participant_id,
                    self.trial_number
                );
                Ok(true)
            }
            _ => Ok(true),
        }
    }
}

impl Driven for App {
    type Error = Box<dyn Error>;

    fn on_key(&mut self, key: KeyEvent, at: Instant) -> Result<bool, Self::Error> {
        App::on_key(self, key, at)
    }

    fn on_tick(&mut self, now: Instant) -> Result<bool, Self::Error> {
        App::on_tick(self, now)
    }

    fn deadline(&self) -> Option<Instant> {
        self.session.deadline()
    }

    fn is_finished(&self) -> bool {
        self.session.has_finished()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    logging::init_default();

    let config = cli.apply(cli.config_store().load());
    let session_config = config.validate()?;
    let sink = CsvSink::open(&config.output)?;
    let session = Session::new(session_config, TrialGenerator::new(cli.seed));
    let mut app = App::new(&cli, &config, session, Box::new(sink));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    app.enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if app.enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                    | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
            )
        )?;
    } else {
        warn!("terminal lacks keyboard enhancement, key releases will not be seen");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &runner);

    if app.enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    runner.run(app, |app| {
        terminal.draw(|f| ui(app, f))?;
        Ok(())
    })
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
