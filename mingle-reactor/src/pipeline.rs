//! Chains of event consumers.
//!
//! A pipeline is an ordered list of elements. An [`EventProcessor`] element
//! observes each event and the pipeline then hands the event on; a
//! [`PipelineProcessor`] element receives the rest of the pipeline as its
//! `next` and decides what, if anything, to forward. Before the first event,
//! every stage gets an [`PipelineProcessor::init`] call that can look at the
//! stages installed ahead of it and add new ones.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use log::trace;
use mingle_core::IdPath;

use crate::{Event, ReactorError, StructuralReactor, TopType};

/// Consumes events.
pub trait EventProcessor {
    /// Handles one event. The first error aborts the traversal.
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError>;
}

impl<T: EventProcessor + ?Sized> EventProcessor for &mut T {
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError> {
        (**self).process_event(ev)
    }
}

impl<T: EventProcessor + ?Sized> EventProcessor for Box<T> {
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError> {
        (**self).process_event(ev)
    }
}

/// Adapts a closure into an [`EventProcessor`].
pub struct ProcessorFn<F>(pub F);

impl<F> ProcessorFn<F>
where
    F: FnMut(Event) -> Result<(), ReactorError>,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> EventProcessor for ProcessorFn<F>
where
    F: FnMut(Event) -> Result<(), ReactorError>,
{
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError> {
        (self.0)(ev)
    }
}

/// Accepts and drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardProcessor;

impl EventProcessor for DiscardProcessor {
    fn process_event(&mut self, _ev: Event) -> Result<(), ReactorError> {
        Ok(())
    }
}

/// Names a stage so later stages can find it during initialization.
pub type ReactorKey = &'static str;

/// The key every [`StructuralReactor`] registers under.
pub const STRUCTURAL_REACTOR_KEY: ReactorKey = "mingle.StructuralReactor";

/// A pipeline stage that decides what to forward to the rest of the
/// pipeline.
pub trait PipelineProcessor {
    /// Called once, in pipeline order, before any event is processed.
    fn init(&mut self, _init: &mut PipelineInit<'_, '_>) {}

    /// The key this stage can be found under, if any.
    fn key(&self) -> Option<ReactorKey> {
        None
    }

    /// A handle on the path at the stage's current position, for stages
    /// that track one.
    fn path_getter(&self) -> Option<PathGetter> {
        None
    }

    /// Handles one event, forwarding whatever it chooses to `next`.
    fn process_event(
        &mut self,
        ev: Event,
        next: &mut dyn EventProcessor,
    ) -> Result<(), ReactorError>;
}

/// Reports "the path at the current position" of the stage that handed it
/// out. Cloning shares the underlying source.
#[derive(Clone)]
pub struct PathGetter(Rc<dyn Fn() -> IdPath>);

impl PathGetter {
    /// A getter backed by `f`.
    pub fn new(f: impl Fn() -> IdPath + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// A getter that always reports `path`.
    pub fn fixed(path: IdPath) -> Self {
        Self::new(move || path.clone())
    }

    /// A getter reporting this getter's path appended to `start`.
    pub fn prefixed(&self, start: IdPath) -> Self {
        if start.is_empty() {
            return self.clone();
        }
        let inner = self.clone();
        Self::new(move || start.append(&inner.path()))
    }

    /// The path right now.
    pub fn path(&self) -> IdPath {
        (self.0)()
    }
}

impl fmt::Debug for PathGetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathGetter({})", self.path())
    }
}

/// One element of a [`ReactorPipeline`].
pub enum PipelineElement<'a> {
    /// Observes every event; the pipeline forwards afterwards.
    Processor(Box<dyn EventProcessor + 'a>),
    /// Forwards through its `next` argument.
    Stage(Box<dyn PipelineProcessor + 'a>),
}

impl PipelineElement<'_> {
    fn key(&self) -> Option<ReactorKey> {
        match self {
            PipelineElement::Stage(s) => s.key(),
            PipelineElement::Processor(_) => None,
        }
    }

    fn path_getter(&self) -> Option<PathGetter> {
        match self {
            PipelineElement::Stage(s) => s.path_getter(),
            PipelineElement::Processor(_) => None,
        }
    }
}

/// What a stage sees of the pipeline during [`PipelineProcessor::init`]:
/// the elements installed ahead of it.
pub struct PipelineInit<'p, 'a> {
    elements: &'p mut Vec<PipelineElement<'a>>,
}

impl<'a> PipelineInit<'_, 'a> {
    fn add(&mut self, mut element: PipelineElement<'a>) {
        if let PipelineElement::Stage(stage) = &mut element {
            stage.init(self);
        }
        self.elements.push(element);
    }

    /// Installs `stage` ahead of the stage being initialized.
    pub fn add_pipeline_processor(&mut self, stage: impl PipelineProcessor + 'a) {
        self.add(PipelineElement::Stage(Box::new(stage)));
    }

    /// Installs `processor` ahead of the stage being initialized.
    pub fn add_event_processor(&mut self, processor: impl EventProcessor + 'a) {
        self.add(PipelineElement::Processor(Box::new(processor)));
    }

    /// Whether an earlier stage registered under `key`.
    pub fn has_key(&self, key: ReactorKey) -> bool {
        self.elements.iter().any(|e| e.key() == Some(key))
    }

    /// The path getter of the first earlier stage registered under `key`.
    pub fn path_getter_for(&self, key: ReactorKey) -> Option<PathGetter> {
        self.elements
            .iter()
            .find(|e| e.key() == Some(key))
            .and_then(PipelineElement::path_getter)
    }

    /// The path getter of the nearest earlier stage that tracks a path.
    pub fn last_path_getter(&self) -> Option<PathGetter> {
        self.elements
            .iter()
            .rev()
            .find_map(PipelineElement::path_getter)
    }

    /// Finds the structural reactor installed ahead of this stage, or
    /// installs one accepting any top-level value, and returns its path
    /// getter.
    pub fn ensure_structural(&mut self) -> PathGetter {
        if let Some(pg) = self.path_getter_for(STRUCTURAL_REACTOR_KEY) {
            return pg;
        }
        trace!("Installing a structural reactor for a later stage");
        let sr = StructuralReactor::new(TopType::Value);
        let pg = sr.getter();
        self.add_pipeline_processor(sr);
        pg
    }
}

/// Builder for [`ReactorPipeline`].
#[derive(Default)]
pub struct ReactorPipelineBuilder<'a> {
    elements: Vec<PipelineElement<'a>>,
}

impl<'a> ReactorPipelineBuilder<'a> {
    /// Appends a stage that forwards through its `next` argument.
    pub fn pipeline_processor(mut self, stage: impl PipelineProcessor + 'a) -> Self {
        self.elements.push(PipelineElement::Stage(Box::new(stage)));
        self
    }

    /// Appends an observer.
    pub fn event_processor(mut self, processor: impl EventProcessor + 'a) -> Self {
        self.elements
            .push(PipelineElement::Processor(Box::new(processor)));
        self
    }

    /// Runs every stage's `init` in order and returns the pipeline.
    pub fn build(self) -> ReactorPipeline<'a> {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        let mut init = PipelineInit {
            elements: &mut elements,
        };
        for element in self.elements {
            init.add(element);
        }
        ReactorPipeline { elements }
    }
}

/// An initialized chain of stages. Feed it events through
/// [`EventProcessor::process_event`].
pub struct ReactorPipeline<'a> {
    elements: Vec<PipelineElement<'a>>,
}

impl<'a> ReactorPipeline<'a> {
    /// Starts an empty pipeline.
    pub fn builder() -> ReactorPipelineBuilder<'a> {
        ReactorPipelineBuilder::default()
    }

    /// Number of installed elements, including any added during init.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the pipeline has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether some stage registered under `key`.
    pub fn has_key(&self, key: ReactorKey) -> bool {
        self.elements.iter().any(|e| e.key() == Some(key))
    }

    /// The path getter of the last stage that tracks a path.
    pub fn last_path_getter(&self) -> Option<PathGetter> {
        self.elements
            .iter()
            .rev()
            .find_map(PipelineElement::path_getter)
    }
}

impl EventProcessor for ReactorPipeline<'_> {
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError> {
        dispatch(&mut self.elements, ev)
    }
}

/// The remainder of a pipeline, handed to a stage as its `next`.
struct PipelineCall<'p, 'a> {
    rest: &'p mut [PipelineElement<'a>],
}

impl EventProcessor for PipelineCall<'_, '_> {
    fn process_event(&mut self, ev: Event) -> Result<(), ReactorError> {
        dispatch(self.rest, ev)
    }
}

fn dispatch(elements: &mut [PipelineElement<'_>], ev: Event) -> Result<(), ReactorError> {
    let Some((first, rest)) = elements.split_first_mut() else {
        return Ok(());
    };
    match first {
        PipelineElement::Stage(stage) => stage.process_event(ev, &mut PipelineCall { rest }),
        PipelineElement::Processor(p) if rest.is_empty() => p.process_event(ev),
        PipelineElement::Processor(p) => {
            p.process_event(ev.clone())?;
            dispatch(rest, ev)
        }
    }
}
