use crate::error::Result;
use crate::message::{Message, Outcome};

/// A set of messages executed in sequence.
///
/// The first child that does not succeed aborts the rest of the sequence.
/// `pre`/`post` of the collection itself still bracket the whole run.
pub struct Collection<C> {
    name: String,
    children: Vec<Box<dyn Message<C>>>,
    outcome: Outcome,
    started: usize,
}

impl<C> Collection<C> {
    pub fn new(name: impl Into<String>, children: Vec<Box<dyn Message<C>>>) -> Self {
        Self {
            name: name.into(),
            children,
            outcome: Outcome::NotRun,
            started: 0,
        }
    }

    pub fn push(&mut self, child: impl Message<C> + 'static) {
        self.children.push(Box::new(child));
    }

    pub fn with(mut self, child: impl Message<C> + 'static) -> Self {
        self.push(child);
        self
    }

    pub fn children(&self) -> &[Box<dyn Message<C>>] {
        &self.children
    }

    /// Children started during the latest send, in order. Siblings skipped
    /// after a failure are not included.
    pub fn executed(&self) -> &[Box<dyn Message<C>>] {
        &self.children[..self.started]
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<C> Message<C> for Collection<C> {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, context: &mut C) -> Result<()> {
        self.outcome = Outcome::NotRun;
        self.started = 0;

        for child in self.children.iter_mut() {
            self.started += 1;
            child.execute(context)?;

            let outcome = child.success();
            if !outcome.is_success() {
                log::info!(
                    "{}: aborting after `{}` ({outcome})",
                    self.name,
                    child.name()
                );
                self.outcome = Outcome::Failed;
                return Ok(());
            }
        }

        self.outcome = Outcome::Succeeded;
        Ok(())
    }

    fn success(&self) -> Outcome {
        self.outcome
    }

    fn as_collection(&self) -> Option<&Collection<C>> {
        Some(self)
    }
}
