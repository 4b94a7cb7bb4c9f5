//! Built-in tool implementations for Foreman.
//!
//! Domain tools (schedules, weather, code lookups, ...) are registered by the
//! embedding application. These are the generic ones every assistant gets:
//! arithmetic, the clock, human notification, and the shared risk list.

pub mod active_risks;
pub mod calculator;
pub mod current_time;
pub mod send_notification;

pub use active_risks::ActiveRisksTool;
pub use calculator::CalculatorTool;
pub use current_time::CurrentTimeTool;
pub use send_notification::SendNotificationTool;

use foreman_core::notify::Notifier;
use foreman_core::tool::ToolRegistry;
use foreman_store::SharedMemory;
use std::sync::Arc;

/// Create a tool registry with all built-in tools.
///
/// `active_risks` is only registered when shared memory is available.
pub fn default_registry(notifier: Arc<dyn Notifier>, memory: Option<SharedMemory>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CalculatorTool));
    registry.register(Box::new(CurrentTimeTool));
    registry.register(Box::new(SendNotificationTool::new(notifier)));
    if let Some(memory) = memory {
        registry.register(Box::new(ActiveRisksTool::new(memory)));
    }
    registry
}
