use morel::Syntax;

/// Markers that identify interpolation spans within string values.
pub enum Marker {
    /// Beginning of an interpolation span, `${`.
    BeginInterpolation = 0,
    /// End of an interpolation span, `}`.
    EndInterpolation = 1,
}

impl From<usize> for Marker {
    fn from(value: usize) -> Self {
        match value {
            0 => Self::BeginInterpolation,
            1 => Self::EndInterpolation,
            _ => unreachable!(),
        }
    }
}

impl From<Marker> for usize {
    fn from(k: Marker) -> Self {
        k as usize
    }
}

/// Return a [`Syntax`] recognizing the interpolation markers.
///
/// The compiled `Finder` is owned by the `Engine` and shared by every
/// render call.
pub fn to_syntax() -> Syntax {
    let markers = vec![
        (Marker::BeginInterpolation.into(), "${".into()),
        (Marker::EndInterpolation.into(), "}".into()),
    ];

    Syntax::new(markers)
}
