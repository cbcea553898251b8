//! Building running alarm lines from stored instances.
//!
//! The factory checks an instance's fields, resolves its input port and
//! starts an [`AlarmLineUnit`]. Each failure is local to the instance
//! being built; nothing is shared between builds except the resolver and
//! the event bus.

pub mod error;
pub mod fields;
pub mod macros;

pub use error::{AlarmLineError, ConfigurationError, FieldError};
pub use fields::{
    validate, FieldDefinition, InstanceDto, ValidatedFields, FIELD_CONTACT_TYPE,
    FIELD_DEFINITIONS, FIELD_DELAY_TIME, FIELD_NAME, FIELD_PORT,
};

use crate::core::{AlarmLineState, StateDescriptor, UnitOptions};
use crate::effects::EventBus;
use crate::ports::InputResolver;
use crate::unit::{AlarmLineUnit, AutomationUnit};
use std::sync::Arc;
use tracing::{info, warn};

/// Creates alarm line units.
///
/// # Example
///
/// ```
/// use alarmline::builder::{AlarmLineFactory, InstanceDto};
/// use alarmline::effects::BroadcastBus;
/// use alarmline::ports::{MemoryInput, PortRegistry};
/// use std::sync::Arc;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = Arc::new(PortRegistry::new());
/// registry.register(Arc::new(MemoryInput::new("gpio-4", false)));
///
/// let factory = AlarmLineFactory::new(registry, Arc::new(BroadcastBus::new(16)));
/// let instance = InstanceDto::new(1)
///     .with_field("name", "Front door")
///     .with_field("portId", "gpio-4");
///
/// let unit = factory.build(&instance).unwrap();
/// unit.shutdown().await;
/// # }
/// ```
#[derive(Clone)]
pub struct AlarmLineFactory {
    resolver: Arc<dyn InputResolver>,
    bus: Arc<dyn EventBus>,
    options: UnitOptions,
}

impl AlarmLineFactory {
    pub fn new(resolver: Arc<dyn InputResolver>, bus: Arc<dyn EventBus>) -> Self {
        Self {
            resolver,
            bus,
            options: UnitOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UnitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &UnitOptions {
        &self.options
    }

    /// States every unit built by this factory can report.
    pub fn states(&self) -> Vec<StateDescriptor> {
        AlarmLineState::descriptors()
    }

    pub fn field_definitions(&self) -> &'static [FieldDefinition] {
        &FIELD_DEFINITIONS
    }

    pub fn field_keys(&self) -> Vec<&'static str> {
        FIELD_DEFINITIONS.iter().map(|field| field.key).collect()
    }

    pub fn validate(&self, instance: &InstanceDto) -> Result<ValidatedFields, ConfigurationError> {
        validate(instance)
    }

    /// Validate `instance`, resolve its input and start the unit.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(&self, instance: &InstanceDto) -> Result<AlarmLineUnit, AlarmLineError> {
        let fields = validate(instance).map_err(|error| {
            warn!(instance_id = instance.id, %error, "Alarm line configuration rejected");
            error
        })?;

        let input = self
            .resolver
            .resolve(&fields.config.source_input_id)
            .map_err(|error| {
                warn!(instance_id = instance.id, %error, "Alarm line input unavailable");
                error
            })?;

        info!(instance_id = instance.id, name = %fields.name, "Building alarm line");

        Ok(AlarmLineUnit::spawn(
            Arc::clone(&self.bus),
            instance.id,
            fields.name,
            self.states(),
            input,
            fields.config,
            self.options,
        ))
    }

    pub fn build_automation_unit(
        &self,
        instance: &InstanceDto,
    ) -> Result<AutomationUnit, AlarmLineError> {
        self.build(instance).map(AutomationUnit::from)
    }
}
