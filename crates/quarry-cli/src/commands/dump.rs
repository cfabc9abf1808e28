use std::fmt::Write;
use std::path::PathBuf;

use quarry_compiler::{CaptureContainer, CompiledUnit, Config, ParamsModel, RuntimesModel};
use quarry_core::{Bid, ContainerTag};
use serde::Serialize;

use super::run_common::{compile_or_exit, render_diagnostics};

pub struct DumpArgs {
    pub unit_path: PathBuf,
    pub config: Config,
    pub json: bool,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let compiled = compile_or_exit(&args.unit_path, &args.config);

    if !compiled.diagnostics.is_empty() {
        eprint!(
            "{}",
            render_diagnostics(&compiled, &args.unit_path, args.color)
        );
    }

    let view = UnitView::new(&compiled);
    if args.json {
        match serde_json::to_string_pretty(&view) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print!("{}", view.render());
    }

    if compiled.has_errors() {
        std::process::exit(1);
    }
}

/// Every installed container of a compiled unit.
#[derive(Debug, Serialize)]
pub struct UnitView<'a> {
    pub unit: &'a str,
    pub decls: Vec<ContainerView<'a>>,
    /// One entry per top-level site, `None` where nothing was resolved.
    pub sites: Vec<Option<ContainerView<'a>>>,
}

#[derive(Debug, Serialize)]
pub struct ContainerView<'a> {
    pub owner: String,
    pub kind: ContainerTag,
    pub uprootable: bool,
    pub xr: &'a str,
    /// Functional rendering of the decoded XR; `None` if it does not decode.
    pub dump: Option<String>,
    pub params: BindingsView,
    /// Present iff the container is Pluckable.
    pub runtimes: Option<BindingsView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingsView {
    Listed { own: Vec<Bid>, inherited: usize },
    /// Read off the runtime instance of the call site.
    Instance,
}

impl<'a> UnitView<'a> {
    pub fn new(compiled: &'a CompiledUnit) -> Self {
        let decls = compiled
            .arena
            .iter()
            .filter_map(|(_, decl)| {
                let container = decl.body.as_ref()?.as_container()?;
                Some(ContainerView::new(decl.qualified_path.clone(), container))
            })
            .collect();
        let sites = compiled
            .sites
            .iter()
            .enumerate()
            .map(|(index, site)| {
                site.as_ref()
                    .map(|c| ContainerView::new(format!("site {index}"), c))
            })
            .collect();
        Self {
            unit: &compiled.name,
            decls,
            sites,
        }
    }

    /// Declarations first, then sites.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[unit {}]", self.unit);

        for view in &self.decls {
            let _ = writeln!(out);
            let _ = writeln!(out, "decl {}", view.owner);
            view.render_body(&mut out);
        }

        for (index, site) in self.sites.iter().enumerate() {
            let _ = writeln!(out);
            match site {
                Some(view) => {
                    let _ = writeln!(out, "{}", view.owner);
                    view.render_body(&mut out);
                }
                None => {
                    let _ = writeln!(out, "site {index}: unresolved");
                }
            }
        }
        out
    }
}

impl<'a> ContainerView<'a> {
    fn new(owner: String, container: &'a CaptureContainer) -> Self {
        Self {
            owner,
            kind: container.kind,
            uprootable: container.is_uprootable(),
            xr: container.xr.as_str(),
            dump: container.decode().ok().map(|xr| xr.to_string()),
            params: BindingsView::from_params(&container.params),
            runtimes: container.runtimes.as_ref().map(BindingsView::from_runtimes),
        }
    }

    fn render_body(&self, out: &mut String) {
        let mode = if self.uprootable {
            "Uprootable"
        } else {
            "Pluckable"
        };
        let _ = writeln!(out, "  {} {}", self.kind, mode);
        let _ = writeln!(out, "  xr       {}", self.xr);
        let _ = writeln!(
            out,
            "  dump     {}",
            self.dump.as_deref().unwrap_or("<malformed>")
        );
        let _ = writeln!(out, "  params   {}", self.params);
        if let Some(runtimes) = &self.runtimes {
            let _ = writeln!(out, "  runtimes {}", runtimes);
        }
    }
}

impl BindingsView {
    fn from_params(params: &ParamsModel) -> Self {
        match params {
            ParamsModel::Listed { inherited, .. } => Self::Listed {
                own: params.bids(),
                inherited: inherited.len(),
            },
            ParamsModel::Instance(_) => Self::Instance,
        }
    }

    fn from_runtimes(runtimes: &RuntimesModel) -> Self {
        match runtimes {
            RuntimesModel::Listed { inherited, .. } => Self::Listed {
                own: runtimes.bids(),
                inherited: inherited.len(),
            },
            RuntimesModel::Instance(_) => Self::Instance,
        }
    }
}

impl std::fmt::Display for BindingsView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listed { own, inherited } => {
                let own: Vec<String> = own.iter().map(Bid::to_string).collect();
                write!(f, "[{}]", own.join(", "))?;
                if *inherited > 0 {
                    write!(f, " + {inherited} inherited")?;
                }
                Ok(())
            }
            Self::Instance => f.write_str("from instance"),
        }
    }
}
