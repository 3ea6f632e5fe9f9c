use std::fmt;

use crate::config::ConfigError;
use crate::variant::SampleId;

/// Marker for an absent parent in a trio list.
pub const MISSING_MEMBER: &str = "-";

/// A child with up to two known parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trio {
    /// Father, if known.
    pub father: Option<SampleId>,
    /// Mother, if known.
    pub mother: Option<SampleId>,
    /// Indexed child.
    pub child: SampleId,
}

impl Trio {
    /// Trio with both parents.
    pub fn new(father: SampleId, mother: SampleId, child: SampleId) -> Self {
        Self {
            father: Some(father),
            mother: Some(mother),
            child,
        }
    }

    /// Trio with any combination of missing parents.
    pub fn partial(father: Option<SampleId>, mother: Option<SampleId>, child: SampleId) -> Self {
        Self {
            father,
            mother,
            child,
        }
    }

    /// Every member id present in this trio.
    pub fn members(&self) -> impl Iterator<Item = SampleId> {
        [self.father, self.mother, Some(self.child)]
            .into_iter()
            .flatten()
    }
}

impl fmt::Display for Trio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let member = |id: Option<SampleId>| id.map_or_else(|| MISSING_MEMBER.to_string(), |id| id.to_string());
        write!(f, "{},{},{}", member(self.father), member(self.mother), self.child)
    }
}

/// A trio named by sample names, before lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrioNames {
    /// Father name, if given.
    pub father: Option<String>,
    /// Mother name, if given.
    pub mother: Option<String>,
    /// Child name.
    pub child: String,
}

impl TrioNames {
    /// Resolve names to ids. `index` is only used for error messages.
    pub fn resolve<F>(&self, index: usize, mut lookup: F) -> Result<Trio, ConfigError>
    where
        F: FnMut(&str) -> Option<SampleId>,
    {
        let mut find = |name: &str| {
            lookup(name).ok_or_else(|| ConfigError::UnknownSample {
                name: name.to_string(),
                index,
            })
        };
        let father = self.father.as_deref().map(&mut find).transpose()?;
        let mother = self.mother.as_deref().map(&mut find).transpose()?;
        let child = find(&self.child)?;
        Ok(Trio::partial(father, mother, child))
    }
}

/// Parse `father,mother,child;...`. A parent given as `-` or left empty is absent.
pub fn parse_trios(text: &str) -> Result<Vec<TrioNames>, ConfigError> {
    let trios = text
        .split(';')
        .map(str::trim)
        .filter(|trio| !trio.is_empty())
        .enumerate()
        .map(|(index, trio)| parse_trio(index, trio))
        .collect::<Result<Vec<_>, _>>()?;
    if trios.is_empty() {
        return Err(ConfigError::EmptyTrioList);
    }
    Ok(trios)
}

fn parse_trio(index: usize, text: &str) -> Result<TrioNames, ConfigError> {
    let members: Vec<&str> = text.split(',').map(str::trim).collect();
    let [father, mother, child] = members.as_slice() else {
        return Err(ConfigError::TrioArity {
            index,
            text: text.to_string(),
            found: members.len(),
        });
    };
    let member = |name: &str| (!name.is_empty() && name != MISSING_MEMBER).then(|| name.to_string());
    let child = member(*child).ok_or_else(|| ConfigError::MissingChild {
        index,
        text: text.to_string(),
    })?;
    Ok(TrioNames {
        father: member(*father),
        mother: member(*mother),
        child,
    })
}
