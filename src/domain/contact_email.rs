/// Reply-to address of a support request.
///
/// Shape check only: `local@domain.tld`, where no part may contain
/// whitespace or a second `@`, and the domain needs a dot with at least one
/// character on each side. The input is not trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEmail(String);

fn is_atom(s: &str) -> bool { !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '@') }

impl ContactEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                is_atom(local)
                    && is_atom(domain)
                    // '.' is a single byte, so byte offsets are fine here
                    && domain
                        .char_indices()
                        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
            }
            None => false,
        };
        match valid {
            true => Ok(Self(email)),
            false => Err(format!("Invalid contact email: {email:?}")),
        }
    }
}

impl AsRef<str> for ContactEmail {
    fn as_ref(&self) -> &str { &self.0 }
}
