use std::{
    fmt,
    time::Instant,
};

use ccgen_front::RuleSet;
use ccgen_middle::{
    Context,
    ResolvedUsage,
    Verifier,
};
use itertools::Itertools;
use tracing::{
    debug,
    info,
};

use crate::{
    codegen::{
        CxxWriter,
        Procedure,
        Synthesizer,
    },
    EmitterConfig,
    Error,
};

const HEADER: &str = "\
/*===- Generated file -------------------------------------------*- C++ -*-===*\\
|*                                                                            *|
|* Calling Convention Implementation Fragment                                 *|
|*                                                                            *|
|* Automatically generated file, do not edit!                                 *|
|*                                                                            *|
\\*===----------------------------------------------------------------------===*/

";

/// Compiles a rule set into a C++ fragment.
///
/// Without the guard macro defined, the fragment declares and defines one procedure per
/// synthesized convention, in declaration order. With it defined, it lists the registers each of
/// them may claim, including the ones claimed through delegation, ordered by convention name.
pub struct Emitter<'rules> {
    rules: &'rules RuleSet,
    config: EmitterConfig,
}

impl<'rules> Emitter<'rules> {
    pub const fn new(rules: &'rules RuleSet, config: EmitterConfig) -> Self {
        Self { rules, config }
    }

    /// Writes the fragment to `sink`.
    ///
    /// Nothing is written unless the whole rule set compiles.
    pub fn emit(&self, sink: &mut impl fmt::Write) -> Result<(), Error> {
        let start = Instant::now();
        let errors = Verifier::new(self.rules).verify();
        if !errors.is_empty() {
            return Err(Error::Verify(errors));
        }
        debug!("Took {:?} to verify rule set", start.elapsed());

        let start = Instant::now();
        let mut ctx = Context::new();
        for convention in &self.rules.conventions {
            ctx.declare(&convention.name);
        }
        let mut synthesizer = Synthesizer::new(&mut ctx);
        let procedures = self
            .rules
            .synthesized()
            .map(|rule| synthesizer.synthesize(rule))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Took {:?} to synthesize {} procedures",
            start.elapsed(),
            procedures.len()
        );

        let start = Instant::now();
        let usage = ctx.resolve()?;
        debug!("Took {:?} to resolve delegations", start.elapsed());

        let code = self.assemble(&procedures, &usage);
        sink.write_str(&code)?;
        info!("Emitted {} calling conventions", procedures.len());
        Ok(())
    }

    pub fn emit_to_string(&self) -> Result<String, Error> {
        let mut code = String::new();
        self.emit(&mut code)?;
        Ok(code)
    }

    fn assemble(&self, procedures: &[Procedure], usage: &ResolvedUsage) -> String {
        let guard = &self.config.guard;
        let mut writer = CxxWriter::new(self.config.entry_point_prefix());
        if self.config.header {
            writer.write(HEADER);
        }
        writer.write_line(&format!("#ifndef {guard}"));
        writer.write("\n");
        for procedure in procedures {
            writer.write_prototype(procedure);
        }
        for procedure in procedures {
            writer.write("\n\n");
            writer.write_procedure(procedure);
        }
        if !procedures.is_empty() {
            writer.write("\n#else\n\n");
            self.write_usage_tables(&mut writer, procedures, usage);
        }
        writer.write_line(&format!("\n#endif // {guard}"));
        writer.finish()
    }

    fn write_usage_tables(
        &self,
        writer: &mut CxxWriter,
        procedures: &[Procedure],
        usage: &ResolvedUsage,
    ) {
        let named = procedures
            .iter()
            .filter_map(|procedure| Some((procedure.name.as_str(), usage.get(&procedure.name)?)))
            .sorted_by_key(|(name, _)| *name)
            .collect::<Vec<_>>();
        for (name, usage) in &named {
            let registers = if usage.primary().is_empty() {
                "0".to_string()
            } else {
                usage.primary().iter().join(", ")
            };
            writer.write_line(&format!("const MCRegister {name}_ArgRegs[] = {{ {registers} }};"));
        }
        let auxiliary = named
            .iter()
            .filter(|(_, usage)| !usage.auxiliary().is_empty())
            .collect::<Vec<_>>();
        if auxiliary.is_empty() {
            return;
        }
        let label = &self.config.auxiliary_label;
        writer.write_line(&format!("\n// Registers used by {label}."));
        for (name, usage) in auxiliary {
            writer.write_line(&format!(
                "const MCRegister {name}_{label}_ArgRegs[] = {{ {} }};",
                usage.auxiliary().iter().join(", ")
            ));
        }
    }
}
