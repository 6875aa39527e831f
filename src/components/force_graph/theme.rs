//! Visual theming for the neighborhood view.
//!
//! Role colors are applied once at fetch time; the rest is read by the
//! renderer every frame.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Fill colors by node role.
#[derive(Clone, Debug)]
pub struct RolePalette {
	/// The entity the neighborhood is centered on.
	pub focus: Color,
	pub chunk: Color,
	/// Every other node.
	pub entity: Color,
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Primary background color
	pub color: Color,
	/// Center color of the radial gradient
	pub color_secondary: Color,
	pub use_gradient: bool,
}

/// Link visual style.
#[derive(Clone, Debug)]
pub struct LinkStyle {
	/// Semi-transparent stroke for link lines.
	pub color: Color,
	/// Arrowheads are drawn a little more opaque than the line.
	pub arrow_color: Color,
}

/// Text and overlay colors.
#[derive(Clone, Debug)]
pub struct LabelStyle {
	pub color: Color,
	pub font_family: &'static str,
	/// Ring around the clicked node.
	pub selection_color: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	pub link: LinkStyle,
	pub label: LabelStyle,
	pub roles: RolePalette,
}

impl Theme {
	/// Dark theme with warm focus highlight (default)
	pub fn default_theme() -> Self {
		Self {
			name: "default",
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				color_secondary: Color::rgb(30, 35, 42),
				use_gradient: true,
			},
			link: LinkStyle {
				color: Color::rgba(140, 160, 180, 0.4),
				arrow_color: Color::rgba(140, 160, 180, 0.8),
			},
			label: LabelStyle {
				color: Color::rgba(230, 237, 243, 0.9),
				font_family: "sans-serif",
				selection_color: Color::rgba(255, 255, 255, 0.85),
			},
			roles: RolePalette {
				focus: Color::rgb(255, 107, 107),
				chunk: Color::rgb(120, 144, 156),
				entity: Color::rgb(94, 129, 172),
			},
		}
	}

	/// Light theme for printing and bright rooms
	pub fn paper() -> Self {
		Self {
			name: "paper",
			background: BackgroundStyle {
				color: Color::rgb(250, 250, 248),
				color_secondary: Color::rgb(250, 250, 248),
				use_gradient: false,
			},
			link: LinkStyle {
				color: Color::rgba(60, 70, 90, 0.35),
				arrow_color: Color::rgba(60, 70, 90, 0.7),
			},
			label: LabelStyle {
				color: Color::rgba(30, 30, 30, 0.9),
				font_family: "sans-serif",
				selection_color: Color::rgba(20, 20, 20, 0.8),
			},
			roles: RolePalette {
				focus: Color::rgb(214, 69, 65),
				chunk: Color::rgb(150, 150, 150),
				entity: Color::rgb(52, 101, 164),
			},
		}
	}

	/// Looks a theme up by name, falling back to the default.
	pub fn by_name(name: &str) -> Self {
		match name {
			"paper" => Self::paper(),
			_ => Self::default_theme(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::default_theme()
	}
}
