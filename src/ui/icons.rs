//! Emoji used across terminal output, with plain-text fallbacks.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Artifact and container indicators
pub static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
pub static CONTAINER: Emoji<'_, '_> = Emoji("📦 ", "[C]");
pub static GLOBE: Emoji<'_, '_> = Emoji("🌐 ", "->");
pub static STOP: Emoji<'_, '_> = Emoji("🛑 ", "[STOP]");
pub static RESET: Emoji<'_, '_> = Emoji("🔄 ", "[RESET]");
pub static DOWNLOAD: Emoji<'_, '_> = Emoji("💾 ", "[SAVE]");
