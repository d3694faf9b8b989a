use super::*;

impl AccessControlService {
    /// Strips unreadable keys from one object and masks the values that
    /// remain.
    ///
    /// The output never contains a key absent from the input, nor a key the
    /// context cannot read. Values whose resolved mask is
    /// [`MaskKind::None`] keep their original JSON type; every other mask
    /// produces a display string.
    pub fn authorize_and_mask_object(
        &self,
        context: &UserPermissionContext,
        entity: EntityKind,
        data: &Value,
    ) -> AppResult<Value> {
        let object = Self::require_object(data)?;

        let fields: Vec<String> = object.keys().cloned().collect();
        let matrix = resolver::field_permissions(context, entity, &fields);

        Ok(Value::Object(self.masked_object(object, entity, &matrix)))
    }

    /// Strips and masks every element of a record list.
    ///
    /// The field matrix is computed once from the union of keys across all
    /// elements, so a key appearing in any element is stripped or masked
    /// consistently everywhere.
    pub fn authorize_and_mask_records(
        &self,
        context: &UserPermissionContext,
        entity: EntityKind,
        items: &[Value],
    ) -> AppResult<Vec<Value>> {
        let mut objects = Vec::with_capacity(items.len());
        let mut fields = BTreeSet::new();
        for item in items {
            let object = Self::require_object(item)?;
            for key in object.keys() {
                fields.insert(key.clone());
            }
            objects.push(object);
        }

        let fields: Vec<String> = fields.into_iter().collect();
        let matrix = resolver::field_permissions(context, entity, &fields);

        Ok(objects
            .into_iter()
            .map(|object| Value::Object(self.masked_object(object, entity, &matrix)))
            .collect())
    }

    /// Drops fields the context cannot read and fields whose resolved read
    /// mask hides content entirely.
    ///
    /// Companion to [`Self::authorize_and_mask_object`] for callers that
    /// keep the default in-place placeholder policy but want hidden fields
    /// omitted from specific responses.
    pub fn remove_hidden_fields(
        &self,
        context: &UserPermissionContext,
        entity: EntityKind,
        data: &Value,
    ) -> AppResult<Value> {
        let object = Self::require_object(data)?;

        let fields: Vec<String> = object.keys().cloned().collect();
        let matrix = resolver::field_permissions(context, entity, &fields);

        let mut output = Map::new();
        for (key, value) in object {
            let Some(mask) = matrix.get(key).and_then(FieldPermission::read_mask) else {
                continue;
            };
            if should_hide_field(mask) {
                continue;
            }

            output.insert(key.clone(), value.clone());
        }

        Ok(Value::Object(output))
    }

    /// Ensures every key of an incoming payload is writable by the context.
    pub fn enforce_writable_fields(
        &self,
        context: &UserPermissionContext,
        entity: EntityKind,
        data: &Value,
    ) -> AppResult<()> {
        let object = Self::require_object(data)?;

        let fields: Vec<String> = object.keys().cloned().collect();
        let matrix = resolver::field_permissions(context, entity, &fields);

        for key in object.keys() {
            let writable = matrix.get(key).is_some_and(FieldPermission::can_write);
            if !writable {
                return Err(AppError::Forbidden(format!(
                    "field '{key}' is not writable for this user"
                )));
            }
        }

        Ok(())
    }

    fn masked_object(
        &self,
        object: &Map<String, Value>,
        entity: EntityKind,
        matrix: &BTreeMap<String, FieldPermission>,
    ) -> Map<String, Value> {
        let mut output = Map::new();

        for (key, value) in object {
            let Some(permission) = matrix.get(key) else {
                continue;
            };
            let Some(mask) = permission.read_mask() else {
                continue;
            };

            if matches!(self.hidden_fields, HiddenFieldPolicy::Remove) && should_hide_field(mask) {
                continue;
            }

            if mask == MaskKind::None {
                output.insert(key.clone(), value.clone());
                continue;
            }

            let raw = Self::raw_text(value);
            let masked = apply_mask(
                raw.as_deref(),
                mask,
                self.classifications.kind_for(entity, key),
                &self.masking,
            );
            output.insert(key.clone(), Value::String(masked));
        }

        output
    }

    fn require_object(data: &Value) -> AppResult<&Map<String, Value>> {
        data.as_object().ok_or_else(|| {
            AppError::Validation("data payload must be a JSON object".to_owned())
        })
    }

    fn raw_text(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}
