//! Projection of uniform request values onto vendor-native request shapes.
//!
//! Every adapter declares, per uniform type and per native request, which fields
//! are carried over by implementing [`Project`]. The helpers here only write a
//! destination field when the source value is non-zero, so a partially filled
//! search or update never overwrites vendor defaults or filters on unset fields.
//! Native request structs hold `Option` fields and are serialized with
//! `skip_serializing_if = "Option::is_none"`.

/// Copy the fields a vendor understands from `self` into `dest`.
///
/// Implementations must only touch `dest` through [`set_str`], [`set_num`] or
/// [`set_flag`] (or an equivalent non-zero check), which is what makes the
/// projection zero-skipping.
pub trait Project<Native> {
    fn project(&self, dest: &mut Native);
}

/// Project `source` onto a fresh, default native request.
pub fn projected<Native: Default>(source: &impl Project<Native>) -> Native {
    let mut dest = Native::default();
    source.project(&mut dest);
    dest
}

/// Set `dest` when `value` is non-empty.
pub fn set_str(dest: &mut Option<String>, value: &str) {
    if !value.is_empty() {
        *dest = Some(value.to_string());
    }
}

/// Set `dest` when `value` differs from the type's zero value.
pub fn set_num<S, T>(dest: &mut Option<T>, value: S)
where
    S: Copy + Default + PartialEq + Into<T>,
{
    if value != S::default() {
        *dest = Some(value.into());
    }
}

/// Set `dest` when `value` is `true`.
pub fn set_flag(dest: &mut Option<bool>, value: bool) {
    if value {
        *dest = Some(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Uniform {
        name: String,
        ttl: u32,
        weight: u16,
        proxied: bool,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Native {
        name: Option<String>,
        ttl: Option<u64>,
        weight: Option<u16>,
        proxied: Option<bool>,
        untouched: Option<String>,
    }

    impl Project<Native> for Uniform {
        fn project(&self, dest: &mut Native) {
            set_str(&mut dest.name, &self.name);
            set_num(&mut dest.ttl, self.ttl);
            set_num(&mut dest.weight, self.weight);
            set_flag(&mut dest.proxied, self.proxied);
        }
    }

    fn prefilled() -> Native {
        Native {
            name: Some("keep".into()),
            ttl: Some(600),
            weight: Some(7),
            proxied: Some(false),
            untouched: Some("vendor default".into()),
        }
    }

    #[test]
    fn non_zero_fields_are_copied_and_widened() {
        let source = Uniform {
            name: "www".into(),
            ttl: 300,
            weight: 5,
            proxied: true,
        };
        let native: Native = projected(&source);
        assert_eq!(native.name.as_deref(), Some("www"));
        assert_eq!(native.ttl, Some(300_u64));
        assert_eq!(native.weight, Some(5));
        assert_eq!(native.proxied, Some(true));
        assert_eq!(native.untouched, None);
    }

    #[test]
    fn all_zero_source_leaves_destination_unmodified() {
        let mut dest = prefilled();
        Uniform::default().project(&mut dest);
        assert_eq!(dest, prefilled());
    }

    #[test]
    fn sources_differing_only_in_zero_fields_project_identically() {
        // Each variant zeroes a different subset of fields; the zeroed fields must
        // keep whatever the destination already held.
        let full = Uniform {
            name: "api".into(),
            ttl: 120,
            weight: 3,
            proxied: true,
        };
        let variants = [
            Uniform {
                name: String::new(),
                ..full.clone()
            },
            Uniform {
                ttl: 0,
                ..full.clone()
            },
            Uniform {
                weight: 0,
                proxied: false,
                ..full.clone()
            },
        ];

        for variant in variants {
            let mut dest = prefilled();
            variant.project(&mut dest);

            let expected = Native {
                name: if variant.name.is_empty() {
                    prefilled().name
                } else {
                    Some(variant.name.clone())
                },
                ttl: if variant.ttl == 0 {
                    prefilled().ttl
                } else {
                    Some(u64::from(variant.ttl))
                },
                weight: if variant.weight == 0 {
                    prefilled().weight
                } else {
                    Some(variant.weight)
                },
                proxied: if variant.proxied {
                    Some(true)
                } else {
                    prefilled().proxied
                },
                untouched: prefilled().untouched,
            };
            assert_eq!(dest, expected, "variant {variant:?}");
        }
    }
}
